use anyhow::Result;
use clap::{Parser, Subcommand};

use botdash::cli::{self, OutputFormat};
use botdash::client::ServiceAction;
use botdash::config;

#[derive(Debug, Parser)]
#[command(name = "botdash")]
#[command(about = "Terminal dashboard for the bot control API")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show service state, feature flags and server info
    Status {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Start the bot service
    Start,
    /// Stop the bot service
    Stop,
    /// Restart the bot service
    Restart,
    /// Toggle a feature flag by its short or full key
    Toggle {
        /// Flag key, e.g. `lock` or `bot_locked`
        flag: String,
    },
    /// Print the service log
    Logs {
        /// Number of recent lines to request
        #[arg(long)]
        limit: Option<usize>,
        /// Keep polling and print new lines as they arrive
        #[arg(long, short)]
        follow: bool,
    },
    /// View or edit the service configuration
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Manage dashboard users
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Poll the service and print changes as they happen
    Watch {
        /// Also tail the service log
        #[arg(long)]
        logs: bool,
    },
    /// Show recent entries from the local event log
    Events {
        /// Number of entries to show
        #[arg(long, default_value = "20")]
        tail: usize,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage botdash's own configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsAction {
    /// Show the configuration as an editable form
    Show {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Set one value and save the configuration
    Set {
        /// `Section.key`, e.g. `Connection.port`
        key: String,
        /// New value; booleans accept true/false
        value: String,
    },
}

#[derive(Debug, Subcommand)]
enum UsersAction {
    /// List users
    List {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Add a user
    Add {
        username: String,
        #[arg(long)]
        password: String,
        /// Password again
        #[arg(long)]
        confirm: String,
        /// admin or super_admin
        #[arg(long, default_value = "admin")]
        role: String,
    },
    /// Delete a user by id
    Delete { id: u64 },
    /// Change a user's password
    Passwd {
        id: u64,
        #[arg(long)]
        password: String,
        /// Password again
        #[arg(long)]
        confirm: String,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config file to ~/.botdash/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file locations
    Path,
}

fn main() -> Result<()> {
    let app = App::parse();
    let config = config::load();

    let ok = match app.command {
        Commands::Status { format } => {
            cli::run_status(&config, OutputFormat::from_str_opt(Some(&format)))?
        }
        Commands::Start => cli::run_service(&config, ServiceAction::Start)?,
        Commands::Stop => cli::run_service(&config, ServiceAction::Stop)?,
        Commands::Restart => cli::run_service(&config, ServiceAction::Restart)?,
        Commands::Toggle { flag } => cli::run_toggle(&config, &flag)?,
        Commands::Logs { limit, follow } => cli::run_logs(&config, limit, follow)?,
        Commands::Settings { action } => match action {
            SettingsAction::Show { format } => {
                cli::run_settings_show(&config, OutputFormat::from_str_opt(Some(&format)))?
            }
            SettingsAction::Set { key, value } => cli::run_settings_set(&config, &key, &value)?,
        },
        Commands::Users { action } => match action {
            UsersAction::List { format } => {
                cli::run_users_list(&config, OutputFormat::from_str_opt(Some(&format)))?
            }
            UsersAction::Add {
                username,
                password,
                confirm,
                role,
            } => cli::run_users_add(&config, &username, &password, &confirm, &role)?,
            UsersAction::Delete { id } => cli::run_users_delete(&config, id)?,
            UsersAction::Passwd {
                id,
                password,
                confirm,
            } => cli::run_users_passwd(&config, id, &password, &confirm)?,
        },
        Commands::Watch { logs } => cli::run_watch(&config, logs)?,
        Commands::Events { tail, format } => {
            cli::run_events(&config, tail, OutputFormat::from_str_opt(Some(&format)))?;
            true
        }
        Commands::Config { action } => {
            match action {
                ConfigAction::Show => cli::run_config_show()?,
                ConfigAction::Init { force } => cli::run_config_init(force)?,
                ConfigAction::Path => cli::run_config_path()?,
            }
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
