/// Configuration schema and defaults for botdash.
///
/// Defines the TOML-serializable configuration with the sections
/// `[server]`, `[polling]`, `[flags]`, `[settings]`, `[logging]` and
/// `[notify]`. Every field has a built-in default; users only set what they
/// want to change.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::settings::FormOptions;
use crate::settings::infer::DEFAULT_MULTILINE_KEYS;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level botdash configuration.
///
/// Maps to `~/.botdash/config.toml` and `.botdash.toml`. All sections and
/// fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub server: ServerConfig,
    pub polling: PollingConfig,
    pub flags: FlagsConfig,
    pub settings: SettingsConfig,
    pub logging: LoggingConfig,
    pub notify: NotifyConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Where the control API lives and how to talk to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the control API.
    pub url: String,
    /// Per-request timeout (milliseconds).
    pub timeout_ms: u64,
    /// Session cookie from an existing login, sent verbatim as `Cookie`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 10_000,
            session_cookie: None,
        }
    }
}

// ---------------------------------------------------------------------------
// [polling]
// ---------------------------------------------------------------------------

/// Fixed polling intervals and log window sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub status_interval_secs: u64,
    /// Only applies while the logs view is active.
    pub logs_interval_secs: u64,
    /// Lines requested per `/logs` fetch.
    pub log_limit: usize,
    /// Lines kept locally.
    pub log_capacity: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            status_interval_secs: 5,
            logs_interval_secs: 15,
            log_limit: 500,
            log_capacity: 500,
        }
    }
}

// ---------------------------------------------------------------------------
// [flags]
// ---------------------------------------------------------------------------

/// Feature flag display settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagsConfig {
    /// Extra or replacement `full_key = "short"` aliases, merged over the
    /// built-in table.
    pub aliases: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// [settings]
// ---------------------------------------------------------------------------

/// Remote configuration editor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Sections never shown in the editor.
    pub hidden_sections: Vec<String>,
    /// Section expanded by default.
    pub expanded_section: String,
    /// Keys edited as multi-line text.
    pub multiline_keys: Vec<String>,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            hidden_sections: vec!["WebUI".to_string()],
            expanded_section: "Connection".to_string(),
            multiline_keys: DEFAULT_MULTILINE_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl SettingsConfig {
    pub fn form_options(&self) -> FormOptions {
        FormOptions {
            hidden_sections: self.hidden_sections.clone(),
            expanded_section: self.expanded_section.clone(),
            multiline_keys: self.multiline_keys.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Structured event log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether events are written at all.
    pub enabled: bool,
    /// Path to the JSONL event log. `~` is expanded to the home directory.
    pub path: String,
    /// Minimum level: `"debug"`, `"info"`, `"warn"`, `"error"`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.botdash/events.jsonl".to_string(),
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [notify]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Seconds a notification stays visible.
    pub ttl_secs: i64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            ttl_secs: crate::notify::DEFAULT_TTL_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl DashConfig {
    /// Annotated default config file, written by `botdash config init`.
    pub fn default_toml() -> String {
        r#"# botdash configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (BOTDASH_*)
#   2. Project config (.botdash.toml in current directory)
#   3. User global config (~/.botdash/config.toml)
#   4. Built-in defaults

[server]
url = "http://127.0.0.1:5000"    # Control API base URL (BOTDASH_URL)
timeout_ms = 10000
# session_cookie = "session=..."  # Cookie from a browser login (BOTDASH_COOKIE)

[polling]
status_interval_secs = 5
logs_interval_secs = 15          # Only while `watch --logs` is active
log_limit = 500                  # Lines requested per fetch
log_capacity = 500               # Lines kept on screen

[flags.aliases]
# night_mode = "night"           # Extra short names for the toggle endpoint

[settings]
hidden_sections = ["WebUI"]
expanded_section = "Connection"
multiline_keys = ["ai_system_instructions", "welcome_message_instructions"]

[logging]
enabled = true
path = "~/.botdash/events.jsonl"
level = "info"                   # debug | info | warn | error

[notify]
ttl_secs = 5
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
