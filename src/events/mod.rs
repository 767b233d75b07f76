use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::schema::LoggingConfig;
use crate::utils::text::expand_home;

// ---------------------------------------------------------------------------
// Event log entry (JSONL)
// ---------------------------------------------------------------------------

/// Severity of an event log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl EventLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single line in the event log (`~/.botdash/events.jsonl`).
///
/// API calls carry `endpoint`, `ok` and `latency_ms`; reconciliation events
/// (log desync, stale response dropped, toggle reverted) carry only `kind`
/// and `message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEntry {
    pub timestamp: String,
    pub level: EventLevel,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ok: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub latency_ms: Option<u64>,
    #[serde(default)]
    pub message: String,
}

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

/// Append-only structured event log.
///
/// Writes are best-effort: an unwritable path never fails the dashboard
/// operation being logged.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: Option<PathBuf>,
    min_level: EventLevel,
}

impl EventLog {
    pub fn from_config(config: &LoggingConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        Self {
            path: expand_home(&config.path),
            min_level: EventLevel::parse(&config.level).unwrap_or(EventLevel::Info),
        }
    }

    pub fn to_path(path: impl Into<PathBuf>, min_level: EventLevel) -> Self {
        Self {
            path: Some(path.into()),
            min_level,
        }
    }

    pub fn disabled() -> Self {
        Self {
            path: None,
            min_level: EventLevel::Error,
        }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    /// Record a reconciliation or session event.
    pub fn record(&self, level: EventLevel, kind: &str, message: impl Into<String>) {
        self.write(EventEntry {
            timestamp: Utc::now().to_rfc3339(),
            level,
            kind: kind.to_string(),
            endpoint: None,
            ok: None,
            latency_ms: None,
            message: message.into(),
        });
    }

    /// Record the outcome of one API request.
    pub fn api_call(&self, endpoint: &str, ok: bool, latency_ms: u64, message: impl Into<String>) {
        self.write(EventEntry {
            timestamp: Utc::now().to_rfc3339(),
            level: if ok { EventLevel::Info } else { EventLevel::Warn },
            kind: "api".to_string(),
            endpoint: Some(endpoint.to_string()),
            ok: Some(ok),
            latency_ms: Some(latency_ms),
            message: message.into(),
        });
    }

    fn write(&self, entry: EventEntry) {
        if entry.level < self.min_level {
            return;
        }
        let _ = self.append(&entry);
    }

    fn append(&self, entry: &EventEntry) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }

    /// Read the last `n` entries. Malformed lines are skipped; a missing
    /// file reads as empty.
    pub fn read_tail(&self, n: usize) -> Vec<EventEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };
        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        let entries: Vec<EventEntry> = BufReader::new(file)
            .lines()
            .map_while(std::result::Result::ok)
            .filter_map(|line| serde_json::from_str::<EventEntry>(&line).ok())
            .collect();

        let skip = entries.len().saturating_sub(n);
        entries.into_iter().skip(skip).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(name: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("botdash-events-{}-{name}", std::process::id()))
            .join("events.jsonl");
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn records_and_reads_back() {
        let path = temp_log("roundtrip");
        let log = EventLog::to_path(&path, EventLevel::Debug);

        log.api_call("GET /status", true, 12, "");
        log.record(EventLevel::Info, "log_desync", "anchor not found, buffer replaced");

        let entries = log.read_tail(10);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].endpoint.as_deref(), Some("GET /status"));
        assert_eq!(entries[0].ok, Some(true));
        assert_eq!(entries[1].kind, "log_desync");
        assert_eq!(entries[1].endpoint, None);
    }

    #[test]
    fn entries_below_min_level_are_dropped() {
        let path = temp_log("level");
        let log = EventLog::to_path(&path, EventLevel::Warn);

        log.api_call("GET /status", true, 3, "");
        log.api_call("POST /start", false, 3, "Bot is already running.");
        log.record(EventLevel::Info, "toggle_reverted", "lock");

        let entries = log.read_tail(10);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, EventLevel::Warn);
    }

    #[test]
    fn successful_calls_recorded_at_default_level() {
        let path = temp_log("default-level");
        let log = EventLog::from_config(&LoggingConfig {
            path: path.to_string_lossy().into_owned(),
            ..LoggingConfig::default()
        });

        log.api_call("GET /status", true, 8, "");

        let entries = log.read_tail(10);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, EventLevel::Info);
        assert_eq!(entries[0].ok, Some(true));
    }

    #[test]
    fn read_tail_limits_and_skips_garbage() {
        let path = temp_log("tail");
        let log = EventLog::to_path(&path, EventLevel::Debug);
        for i in 0..5 {
            log.record(EventLevel::Info, "tick", format!("{i}"));
        }
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "not json").unwrap();

        let entries = log.read_tail(2);
        let messages: Vec<&str> = entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["3", "4"]);
    }

    #[test]
    fn disabled_log_reads_empty() {
        let log = EventLog::disabled();
        log.record(EventLevel::Error, "x", "y");
        assert!(log.read_tail(5).is_empty());
        assert!(log.path().is_none());
    }

    #[test]
    fn from_config_respects_enabled_flag() {
        let config = LoggingConfig {
            enabled: false,
            ..LoggingConfig::default()
        };
        assert!(EventLog::from_config(&config).path().is_none());
    }

    #[test]
    fn level_parse() {
        assert_eq!(EventLevel::parse("WARNING"), Some(EventLevel::Warn));
        assert_eq!(EventLevel::parse("debug"), Some(EventLevel::Debug));
        assert_eq!(EventLevel::parse("loud"), None);
    }
}
