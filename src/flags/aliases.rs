/// Short aliases for feature flags.
///
/// The service reports flags by their full attribute name
/// (`allow_gemini_pm`) but its toggle endpoint and the dashboard use a short
/// form (`geminipm`). Flags with no alias are shown under their full name.
use std::collections::BTreeMap;

/// Built-in `full key → display key` table.
pub const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("announce_join_leave", "jcl"),
    ("allow_channel_messages", "chanmsg"),
    ("allow_broadcast", "broadcast"),
    ("allow_gemini_pm", "geminipm"),
    ("allow_gemini_channel", "geminichan"),
    ("filter_enabled", "filter"),
    ("bot_locked", "lock"),
    ("context_history_enabled", "context_history"),
    ("debug_logging_enabled", "debug_logging"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagAliases {
    by_full: BTreeMap<String, String>,
}

impl Default for FlagAliases {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FlagAliases {
    /// An empty table: every flag displays under its full key.
    pub fn empty() -> Self {
        Self {
            by_full: BTreeMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut aliases = Self::empty();
        for (full, short) in BUILTIN_ALIASES {
            aliases.insert(*full, *short);
        }
        aliases
    }

    /// The built-in table with `overrides` merged on top.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut aliases = Self::builtin();
        for (full, short) in overrides {
            aliases.insert(full.clone(), short.clone());
        }
        aliases
    }

    pub fn insert(&mut self, full_key: impl Into<String>, display_key: impl Into<String>) {
        self.by_full.insert(full_key.into(), display_key.into());
    }

    /// Display key for a full key, falling back to the full key itself.
    pub fn display_key<'a>(&'a self, full_key: &'a str) -> &'a str {
        self.by_full
            .get(full_key)
            .map(String::as_str)
            .unwrap_or(full_key)
    }
}
