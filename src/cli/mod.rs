//! CLI command implementations for botdash.
//!
//! Provides subcommand handlers for:
//! - `botdash status` — service state, feature flags, server info
//! - `botdash start|stop|restart` — service lifecycle
//! - `botdash toggle <flag>` — flip a feature flag
//! - `botdash logs [--limit N] [--follow]` — tail the service log
//! - `botdash settings show|set` — edit the service configuration
//! - `botdash users list|add|delete|passwd` — user management
//! - `botdash watch [--logs]` — poll and print changes as they happen
//! - `botdash events` — recent entries from the local event log
//! - `botdash config show|init|path` — botdash's own configuration
//!
//! Handlers that talk to the service return `Ok(false)` when the operation
//! failed and the failure has already been printed as a notice.

use std::sync::LazyLock;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use regex::Regex;

use crate::client::{HttpClient, Role, ServiceAction};
use crate::config::{self, DashConfig};
use crate::dashboard::Dashboard;
use crate::dashboard::schedule::{Job, Schedule};
use crate::events::{EventEntry, EventLevel, EventLog};
use crate::flags::{FlagEvent, FlagListener};
use crate::logs::LogDelta;
use crate::notify::{Level, Notice};
use crate::settings::{FieldKind, FieldValue, FormModel};
use crate::users::UserDraft;
use crate::utils::text::truncate;

/// Output format for read commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

type HttpDashboard = Dashboard<HttpClient>;

/// Build a dashboard session against the configured server.
pub fn connect(config: &DashConfig) -> HttpDashboard {
    let events = EventLog::from_config(&config.logging);
    let api = HttpClient::from_config(&config.server, events.clone());
    Dashboard::new(api, config, events)
}

fn print_notices(dash: &mut HttpDashboard) {
    for notice in dash.take_notices() {
        print_notice(&notice);
    }
}

fn print_notice(notice: &Notice) {
    let marker = match notice.level {
        Level::Success => "✓".green().bold(),
        Level::Info => "·".blue().bold(),
        Level::Warning => "!".yellow().bold(),
        Level::Danger => "✗".red().bold(),
    };
    println!("{} {}", marker, notice.message);
}

// ---------------------------------------------------------------------------
// botdash status
// ---------------------------------------------------------------------------

/// Show the service state, its feature flags and server information.
pub fn run_status(config: &DashConfig, format: OutputFormat) -> Result<bool> {
    let mut dash = connect(config);
    if dash.refresh_status().is_err() {
        print_notices(&mut dash);
        return Ok(false);
    }

    match format {
        OutputFormat::Json => print_status_json(&dash)?,
        OutputFormat::Table => print_status_table(&dash),
    }
    Ok(true)
}

fn print_status_json(dash: &HttpDashboard) -> Result<()> {
    let status = dash.status();
    let flags: serde_json::Map<String, serde_json::Value> = dash
        .flags()
        .flags()
        .map(|flag| (flag.display_key.clone(), serde_json::Value::Bool(flag.enabled)))
        .collect();
    let value = serde_json::json!({
        "running": status.is_some_and(|s| s.running),
        "logged_in": status.and_then(|s| s.logged_in),
        "in_channel": status.and_then(|s| s.in_channel),
        "features": flags,
        "server_info": status.and_then(|s| s.server_info.clone()),
        "error": status.and_then(|s| s.error.clone()),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_status_table(dash: &HttpDashboard) {
    let Some(status) = dash.status() else {
        return;
    };

    println!("{}", "Bot Status".bold().cyan());
    println!("{}", "=".repeat(50));
    let state = if status.running {
        "running".green().bold()
    } else {
        "stopped".red().bold()
    };
    println!("  {} {}", "Service:   ".bold(), state);
    if let Some(logged_in) = status.logged_in {
        println!("  {} {}", "Logged in: ".bold(), yes_no(logged_in));
    }
    if let Some(in_channel) = status.in_channel {
        println!("  {} {}", "In channel:".bold(), yes_no(in_channel));
    }
    if let Some(error) = &status.error {
        println!("  {} {}", "Error:     ".bold(), error.red());
    }
    println!();

    println!("{}", "Feature Flags".bold().cyan());
    if dash.flags().shows_placeholder() {
        println!("  {}", "Bot is not running.".dimmed());
    } else if dash.flags().is_empty() {
        println!("  {}", "No feature flags reported.".dimmed());
    } else {
        for flag in dash.flags().flags() {
            println!(
                "  {} {:<28} {}",
                flag_box(flag.enabled),
                flag.display_key,
                flag.full_key.dimmed()
            );
        }
    }

    if let Some(info) = &status.server_info
        && !info.is_empty()
    {
        println!();
        println!("{}", "Server Info".bold().cyan());
        for (key, value) in info {
            let shown = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            println!("  {:<24} {}", key.bold(), truncate(&shown, 60));
        }
    }
}

fn yes_no(value: bool) -> ColoredString {
    if value { "yes".green() } else { "no".yellow() }
}

fn flag_box(enabled: bool) -> ColoredString {
    if enabled {
        "[x]".green().bold()
    } else {
        "[ ]".dimmed()
    }
}

/// Prints flag changes as the reconciler reports them.
pub struct FlagPrinter;

impl FlagListener for FlagPrinter {
    fn on_flag_event(&mut self, event: &FlagEvent) {
        match event {
            FlagEvent::Added {
                key,
                full_key,
                enabled,
            } => println!(
                "{} {} {} {}",
                "+".green().bold(),
                flag_box(*enabled),
                key,
                full_key.dimmed()
            ),
            FlagEvent::Updated { key, enabled } => {
                println!("{} {} {}", "~".yellow().bold(), flag_box(*enabled), key)
            }
            FlagEvent::Removed { key } => println!("{} {}", "-".red().bold(), key),
            FlagEvent::PlaceholderShown => println!("  {}", "Bot is not running.".dimmed()),
            FlagEvent::PlaceholderHidden => println!("  {}", "Bot is running.".green()),
        }
    }
}

// ---------------------------------------------------------------------------
// botdash start | stop | restart | toggle
// ---------------------------------------------------------------------------

pub fn run_service(config: &DashConfig, action: ServiceAction) -> Result<bool> {
    let mut dash = connect(config);
    let ok = dash.service(action).is_ok();
    print_notices(&mut dash);
    if let Some(status) = dash.status() {
        let state = if status.running {
            "running".green()
        } else {
            "stopped".red()
        };
        println!("  {} {}", "Service:".bold(), state);
    }
    Ok(ok)
}

pub fn run_toggle(config: &DashConfig, flag: &str) -> Result<bool> {
    let mut dash = connect(config);
    if dash.refresh_status().is_err() {
        print_notices(&mut dash);
        return Ok(false);
    }
    if dash.flags().shows_placeholder() {
        println!("{}", "Bot is not running; no feature flags to toggle.".yellow());
        return Ok(false);
    }

    let result = dash.toggle_flag(flag);
    print_notices(&mut dash);
    match result {
        Ok(enabled) => {
            println!("  {} {}", flag_box(enabled), flag);
            Ok(true)
        }
        // Unknown flag: nothing was sent, so no notice was raised.
        Err(err) if err.downcast_ref::<crate::client::Error>().is_none() => Err(err),
        Err(_) => Ok(false),
    }
}

// ---------------------------------------------------------------------------
// botdash logs
// ---------------------------------------------------------------------------

/// Matches the level field of `asctime - LEVEL - message` log lines.
static LEVEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r" - (DEBUG|INFO|WARNING|ERROR|CRITICAL) - ").expect("level regex must compile")
});

fn level_of(line: &str) -> Option<&str> {
    LEVEL_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn colorize_log_line(line: &str) -> ColoredString {
    match level_of(line) {
        Some("DEBUG") => line.dimmed(),
        Some("WARNING") => line.yellow(),
        Some("ERROR") | Some("CRITICAL") => line.red(),
        _ => line.normal(),
    }
}

fn print_delta(delta: &LogDelta) {
    match delta {
        LogDelta::Unchanged => {}
        LogDelta::Appended { lines, .. } => {
            for line in lines {
                println!("{}", colorize_log_line(line));
            }
        }
        LogDelta::Replaced { lines } => {
            println!("{}", "--- log window moved, showing latest ---".dimmed());
            for line in lines {
                println!("{}", colorize_log_line(line));
            }
        }
    }
}

/// Print the recent log window; with `follow`, keep polling and print only
/// new lines.
pub fn run_logs(config: &DashConfig, limit: Option<usize>, follow: bool) -> Result<bool> {
    let mut config = config.clone();
    if let Some(limit) = limit {
        config.polling.log_limit = limit;
    }
    let mut dash = connect(&config);

    let first = dash.refresh_logs();
    print_notices(&mut dash);
    match first {
        Ok(delta) => print_delta(&delta),
        Err(_) if !follow => return Ok(false),
        Err(_) => {}
    }
    if !follow {
        if dash.log_buffer().is_empty() {
            println!("{}", "No log lines yet.".dimmed());
        }
        return Ok(true);
    }

    let interval = Duration::from_secs(config.polling.logs_interval_secs.max(1));
    loop {
        thread::sleep(interval);
        if let Ok(delta) = dash.refresh_logs() {
            print_delta(&delta);
        }
        print_notices(&mut dash);
    }
}

// ---------------------------------------------------------------------------
// botdash settings show | set
// ---------------------------------------------------------------------------

/// Show the service configuration as an editable form.
pub fn run_settings_show(config: &DashConfig, format: OutputFormat) -> Result<bool> {
    let mut dash = connect(config);
    if dash.refresh_config().is_err() {
        print_notices(&mut dash);
        return Ok(false);
    }
    let Some(form) = dash.form() else {
        return Ok(false);
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(form)?),
        OutputFormat::Table => print_form(form),
    }
    Ok(true)
}

fn print_form(form: &FormModel) {
    if form.sections.is_empty() {
        println!("{}", "The service reported no configuration.".yellow());
        return;
    }

    for section in &form.sections {
        let marker = if section.expanded { "▾" } else { "▸" };
        println!("{} {}", marker.dimmed(), section.title.bold().cyan());
        for field in &section.fields {
            println!(
                "  {:<32} {:<10} {}",
                format!("{}.{}", section.name, field.key),
                field.kind.to_string().dimmed(),
                display_value(field.kind, &field.value)
            );
        }
        println!();
    }
}

fn display_value(kind: FieldKind, value: &FieldValue) -> String {
    match (kind, value) {
        (_, FieldValue::Flag(enabled)) => flag_box(*enabled).to_string(),
        (FieldKind::Password, FieldValue::Text(text)) if text.is_empty() => String::new(),
        (FieldKind::Password, FieldValue::Text(_)) => "********".to_string(),
        (FieldKind::MultilineText, FieldValue::Text(text)) => {
            let first = text.lines().next().unwrap_or_default();
            let more = text.lines().count().saturating_sub(1);
            if more > 0 {
                format!("{} {}", truncate(first, 40), format!("(+{more} lines)").dimmed())
            } else {
                truncate(first, 40)
            }
        }
        (_, FieldValue::Text(text)) => truncate(text, 60),
    }
}

/// Edit one `Section.key` in the service configuration and save it.
pub fn run_settings_set(config: &DashConfig, path: &str, value: &str) -> Result<bool> {
    let (section, key) = path
        .split_once('.')
        .context("expected Section.key, e.g. Connection.port")?;

    let mut dash = connect(config);
    if dash.refresh_config().is_err() {
        print_notices(&mut dash);
        return Ok(false);
    }
    dash.form_mut()
        .context("configuration has not been loaded")?
        .set(section, key, value)?;

    let saved = dash.save_config().is_ok();
    print_notices(&mut dash);
    Ok(saved)
}

// ---------------------------------------------------------------------------
// botdash users
// ---------------------------------------------------------------------------

pub fn run_users_list(config: &DashConfig, format: OutputFormat) -> Result<bool> {
    let mut dash = connect(config);
    let Ok(users) = dash.users() else {
        print_notices(&mut dash);
        return Ok(false);
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&users)?),
        OutputFormat::Table => {
            println!("{}", "Users".bold().cyan());
            println!("  {:>4} {:<24} Role", "ID", "Username");
            println!("  {}", "-".repeat(40));
            for user in &users {
                println!("  {:>4} {:<24} {}", user.id, user.username, user.role);
            }
        }
    }
    Ok(true)
}

pub fn run_users_add(
    config: &DashConfig,
    username: &str,
    password: &str,
    confirm: &str,
    role: &str,
) -> Result<bool> {
    let role = Role::parse(role)
        .with_context(|| format!("unknown role: {role} (expected admin or super_admin)"))?;
    let draft = UserDraft {
        username: username.to_string(),
        password: password.to_string(),
        confirm_password: confirm.to_string(),
        role,
    };

    let mut dash = connect(config);
    let ok = dash.add_user(&draft).is_ok();
    print_notices(&mut dash);
    Ok(ok)
}

pub fn run_users_delete(config: &DashConfig, id: u64) -> Result<bool> {
    let mut dash = connect(config);
    let ok = dash.delete_user(id).is_ok();
    print_notices(&mut dash);
    Ok(ok)
}

pub fn run_users_passwd(config: &DashConfig, id: u64, password: &str, confirm: &str) -> Result<bool> {
    let mut dash = connect(config);
    let ok = dash.change_password(id, password, confirm).is_ok();
    print_notices(&mut dash);
    Ok(ok)
}

// ---------------------------------------------------------------------------
// botdash watch
// ---------------------------------------------------------------------------

/// Poll on the configured schedule and print every change.
pub fn run_watch(config: &DashConfig, with_logs: bool) -> Result<bool> {
    let mut dash = connect(config);
    dash.subscribe(Box::new(FlagPrinter));

    let mut schedule = Schedule::from_config(&config.polling);
    schedule.set_logs_active(with_logs);

    println!(
        "{} {} {}",
        "Watching".bold().cyan(),
        dash.api().base_url(),
        "(Ctrl-C to stop)".dimmed()
    );

    let mut last_running = None;
    loop {
        for job in schedule.due(Instant::now()) {
            match job {
                Job::Status => {
                    if dash.refresh_status().is_ok() {
                        let running = dash.status().is_some_and(|s| s.running);
                        if last_running != Some(running) {
                            let state = if running {
                                "running".green().bold()
                            } else {
                                "stopped".red().bold()
                            };
                            println!("{} service {}", "●".dimmed(), state);
                            last_running = Some(running);
                        }
                    }
                }
                Job::Logs => {
                    if let Ok(delta) = dash.refresh_logs() {
                        print_delta(&delta);
                    }
                }
            }
        }
        print_notices(&mut dash);
        thread::sleep(Duration::from_secs(1));
    }
}

// ---------------------------------------------------------------------------
// botdash events
// ---------------------------------------------------------------------------

/// Show the most recent entries of the local event log.
pub fn run_events(config: &DashConfig, tail: usize, format: OutputFormat) -> Result<()> {
    let log = EventLog::from_config(&config.logging);
    let entries = log.read_tail(tail);

    if entries.is_empty() {
        println!(
            "{}",
            "No events recorded yet. Run a command against the service first.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Table => {
            for entry in &entries {
                print_event(entry);
            }
        }
    }
    Ok(())
}

fn print_event(entry: &EventEntry) {
    let level = match entry.level {
        EventLevel::Debug => "debug".dimmed(),
        EventLevel::Info => "info ".blue(),
        EventLevel::Warn => "warn ".yellow(),
        EventLevel::Error => "error".red(),
    };
    let time = entry.timestamp.get(..19).unwrap_or(&entry.timestamp);
    let mut line = format!("{} {} {:<16}", time.dimmed(), level, entry.kind);
    if let Some(endpoint) = &entry.endpoint {
        line.push_str(&format!(" {endpoint}"));
    }
    if let Some(latency) = entry.latency_ms {
        line.push_str(&format!(" {}", format!("{latency}ms").dimmed()));
    }
    if !entry.message.is_empty() {
        line.push_str(&format!(" {}", truncate(&entry.message, 80)));
    }
    println!("{line}");
}

// ---------------------------------------------------------------------------
// botdash config show | init | path
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective botdash Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file().is_some_and(|p| p.exists());
    let project_exists = config::project_config_file().is_some_and(|p| p.exists());
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.botdash/config.toml");
    print_source(project_exists, ".botdash.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "BOTDASH_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(exists: bool, name: &str) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.botdash/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!(
        "  {}",
        "Edit the file to point botdash at your service.".dimmed()
    );
    Ok(())
}

/// Print the config file locations.
pub fn run_config_path() -> Result<()> {
    let global = config::global_config_file().context("could not determine home directory")?;
    println!("{}", global.display());
    if let Some(project) = config::project_config_file() {
        println!("{}", project.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Table);
    }

    #[test]
    fn level_extraction() {
        assert_eq!(
            level_of("2024-05-01 10:00:00,123 - ERROR - connection lost"),
            Some("ERROR")
        );
        assert_eq!(
            level_of("2024-05-01 10:00:00,123 - INFO - joined channel - lobby"),
            Some("INFO")
        );
        assert_eq!(level_of("Traceback (most recent call last):"), None);
    }

    #[test]
    fn passwords_are_masked() {
        let shown = display_value(FieldKind::Password, &FieldValue::Text("hunter2".into()));
        assert_eq!(shown, "********");
        let empty = display_value(FieldKind::Password, &FieldValue::Text(String::new()));
        assert!(empty.is_empty());
    }

    #[test]
    fn multiline_values_show_first_line() {
        colored::control::set_override(false);
        let shown = display_value(
            FieldKind::MultilineText,
            &FieldValue::Text("Be helpful.\nBe brief.".into()),
        );
        assert_eq!(shown, "Be helpful. (+1 lines)");
    }
}
