/// Configuration system for botdash.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — hardcoded in [`schema::DashConfig::default()`]
/// 2. **User global config** — `~/.botdash/config.toml`
/// 3. **Project local config** — `.botdash.toml` in the current directory
/// 4. **Environment variables** — `BOTDASH_*` overrides (highest precedence)
///
/// This is botdash's own client configuration. The remote service's
/// configuration is edited through [`crate::settings`].
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::DashConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration: defaults → global TOML →
/// project TOML → env vars.
pub fn load() -> DashConfig {
    let mut config = load_layers(&[global_config_path(), project_config_path()]);
    apply_env_overrides(&mut config);
    config
}

/// Resolve a stack of TOML files, later files winning key by key.
///
/// Tables are merged recursively, so a project file that only sets
/// `[polling] log_limit` keeps the global file's `[server] url`. Missing or
/// malformed files are skipped.
fn load_layers(paths: &[Option<PathBuf>]) -> DashConfig {
    let mut merged = toml::Table::new();
    for path in paths {
        if let Some(layer) = load_toml_table(path.as_deref()) {
            merge_tables(&mut merged, layer);
        }
    }
    toml::Value::Table(merged).try_into().unwrap_or_default()
}

/// Read one layer as a raw table. A file that does not deserialize into
/// [`DashConfig`] on its own is rejected whole.
fn load_toml_table(path: Option<&Path>) -> Option<toml::Table> {
    let content = fs::read_to_string(path?).ok()?;
    toml::from_str::<DashConfig>(&content).ok()?;
    content.parse::<toml::Table>().ok()
}

/// Deep-merge `overlay` into `base`. Scalars and arrays replace; tables
/// merge key by key.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(overlay_table) => match base.get_mut(&key) {
                Some(toml::Value::Table(base_table)) => merge_tables(base_table, overlay_table),
                _ => {
                    base.insert(key, toml::Value::Table(overlay_table));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".botdash").join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".botdash.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `BOTDASH_URL` — control API base URL
/// - `BOTDASH_TIMEOUT_MS` — request timeout
/// - `BOTDASH_COOKIE` — session cookie
/// - `BOTDASH_LOG_LIMIT` — lines requested per `/logs` fetch
/// - `BOTDASH_LOGGING` — event log on/off (`1`/`true`/`yes`/`on`)
fn apply_env_overrides(config: &mut DashConfig) {
    if let Ok(val) = std::env::var("BOTDASH_URL")
        && !val.is_empty()
    {
        config.server.url = val;
    }
    if let Ok(val) = std::env::var("BOTDASH_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.server.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("BOTDASH_COOKIE")
        && !val.is_empty()
    {
        config.server.session_cookie = Some(val);
    }
    if let Ok(val) = std::env::var("BOTDASH_LOG_LIMIT")
        && let Ok(limit) = val.parse::<usize>()
    {
        config.polling.log_limit = limit;
    }
    if let Ok(val) = std::env::var("BOTDASH_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / show
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.botdash/config.toml`.
///
/// Fails if the file already exists unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.botdash/ directory")?;
    }

    fs::write(&path, DashConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("true"));
        assert!(is_truthy("YES"));
        assert!(is_truthy("on"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    fn write_layer(dir: &Path, name: &str, content: &str) -> Option<PathBuf> {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        Some(path)
    }

    fn layer_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("botdash-config-{}-{name}", std::process::id()))
    }

    #[test]
    fn project_layer_keeps_unrelated_global_values() {
        let dir = layer_dir("layers");
        let global = write_layer(&dir, "global.toml", "[server]\nurl = \"http://bot.lan:9000\"\n");
        let project = write_layer(&dir, "project.toml", "[polling]\nlog_limit = 50\n");

        let config = load_layers(&[global, project]);
        assert_eq!(config.server.url, "http://bot.lan:9000");
        assert_eq!(config.polling.log_limit, 50);
        assert_eq!(config.server.timeout_ms, 10_000);
    }

    #[test]
    fn later_layer_wins_per_key() {
        let dir = layer_dir("override");
        let global = write_layer(
            &dir,
            "global.toml",
            "[server]\nurl = \"http://a:1\"\ntimeout_ms = 2000\n\n[flags.aliases]\nnight_mode = \"night\"\n",
        );
        let project = write_layer(
            &dir,
            "project.toml",
            "[server]\nurl = \"http://b:2\"\n\n[flags.aliases]\nday_mode = \"day\"\n",
        );

        let config = load_layers(&[global, project]);
        assert_eq!(config.server.url, "http://b:2");
        assert_eq!(config.server.timeout_ms, 2000);
        assert_eq!(config.flags.aliases["night_mode"], "night");
        assert_eq!(config.flags.aliases["day_mode"], "day");
    }

    #[test]
    fn malformed_layer_is_skipped() {
        let dir = layer_dir("malformed");
        let global = write_layer(&dir, "global.toml", "[server]\nurl = \"http://bot.lan:9000\"\n");
        let broken = write_layer(&dir, "project.toml", "[polling]\nlog_limit = \"lots\"\n");
        let missing = Some(dir.join("absent.toml"));

        let config = load_layers(&[global, broken, missing]);
        assert_eq!(config.server.url, "http://bot.lan:9000");
        assert_eq!(config.polling.log_limit, 500);
    }

    #[test]
    fn load_produces_usable_config() {
        // Reflects any ~/.botdash/config.toml present on the machine.
        let config = load();
        assert!(!config.server.url.is_empty());
    }

    #[test]
    fn show_effective_config_returns_toml() {
        let toml_str = show_effective_config().unwrap();
        let _: DashConfig = toml::from_str(&toml_str).unwrap();
    }

    #[test]
    fn config_paths_point_at_botdash_files() {
        if let Some(global) = global_config_file() {
            assert!(global.ends_with(".botdash/config.toml"));
        }
        if let Some(project) = project_config_file() {
            assert!(project.ends_with(".botdash.toml"));
        }
    }
}
