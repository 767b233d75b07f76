/// Turn a snake_case identifier into a display label: `allow_broadcast`
/// becomes `ALLOW BROADCAST`.
pub fn humanize_key(key: &str) -> String {
    key.replace('_', " ").to_uppercase()
}

/// Truncate to at most `max` characters, appending `...` when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> Option<std::path::PathBuf> {
    if let Some(rest) = path.strip_prefix("~/") {
        return dirs::home_dir().map(|home| home.join(rest));
    }
    if path == "~" {
        return dirs::home_dir();
    }
    Some(std::path::PathBuf::from(path))
}
