/// Wire types for the control API.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{Error, Result};
use crate::flags::FlagSnapshot;
use crate::settings::ConfigSnapshot;

/// Response body from `GET /status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub features: Option<FlagSnapshot>,
    #[serde(default)]
    pub server_info: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub config: Option<ConfigSnapshot>,
    #[serde(default)]
    pub logged_in: Option<bool>,
    #[serde(default)]
    pub in_channel: Option<bool>,
    /// Set when the server failed while building the status.
    #[serde(default)]
    pub error: Option<String>,
}

/// `{status, message}` reply shared by every mutating endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl ActionResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Turn any non-`success` status into [`Error::Rejected`].
    pub fn into_result(self, endpoint: &str) -> Result<String> {
        if self.is_success() {
            Ok(self.message)
        } else {
            Err(Error::Rejected {
                endpoint: endpoint.to_string(),
                message: self.message,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "admin" => Some(Self::Admin),
            "super_admin" | "superadmin" => Some(Self::SuperAdmin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::SuperAdmin => write!(f, "super_admin"),
        }
    }
}

/// One entry of `GET /users`. Roles are kept as sent; the server may know
/// roles this client does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub role: String,
}

/// Request body for `POST /users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// Request body for `PUT /users/{id}`.
#[derive(Debug, Serialize)]
pub(crate) struct PasswordChange<'a> {
    pub password: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_running_with_features() {
        let json = r#"{
            "running": true,
            "logged_in": true,
            "in_channel": false,
            "features": {"bot_locked": false, "allow_broadcast": true},
            "server_info": {"host": "tt.example.org", "tcp_port": 10333},
            "config": {"Bot": {"bot_locked": false}}
        }"#;
        let status: StatusSnapshot = serde_json::from_str(json).unwrap();
        assert!(status.running);
        let features = status.features.unwrap();
        assert_eq!(features["allow_broadcast"], true);
        assert_eq!(status.server_info.unwrap()["tcp_port"], 10333);
        assert_eq!(status.config.unwrap().get("Bot", "bot_locked"), Some("False"));
    }

    #[test]
    fn status_parses_minimal_stopped() {
        let status: StatusSnapshot = serde_json::from_str(r#"{"running": false}"#).unwrap();
        assert!(!status.running);
        assert!(status.features.is_none());
        assert!(status.config.is_none());
    }

    #[test]
    fn status_parses_error_body() {
        let status: StatusSnapshot =
            serde_json::from_str(r#"{"running": false, "error": "boom"}"#).unwrap();
        assert_eq!(status.error.as_deref(), Some("boom"));
    }

    #[test]
    fn action_response_status_handling() {
        let ok = ActionResponse {
            status: "success".into(),
            message: "Bot starting...".into(),
        };
        assert_eq!(ok.into_result("POST /start").unwrap(), "Bot starting...");

        let info = ActionResponse {
            status: "info".into(),
            message: "Bot is already running.".into(),
        };
        let err = info.into_result("POST /start").unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(err.to_string(), "Bot is already running.");
    }

    #[test]
    fn role_parse_and_serialize() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("super-admin"), Some(Role::SuperAdmin));
        assert_eq!(Role::parse("root"), None);
        let body = NewUser {
            username: "ops".into(),
            password: "pw".into(),
            role: Role::SuperAdmin,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"username": "ops", "password": "pw", "role": "super_admin"})
        );
    }
}
