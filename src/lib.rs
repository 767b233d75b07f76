//! botdash: terminal dashboard for a chat bot's HTTP control API.
//!
//! The [`dashboard`] session owns three reconcilers, one per view:
//! [`logs`] appends new log lines, [`flags`] keeps feature-flag controls in
//! step with the service, and [`settings`] turns the schema-less service
//! configuration into an editable form and back. [`client`] talks to the
//! service; [`cli`] prints what the reconcilers report.

pub mod cli;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod events;
pub mod flags;
pub mod logs;
pub mod notify;
pub mod settings;
pub mod users;
pub mod utils;
