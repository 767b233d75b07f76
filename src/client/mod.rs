/// Control API client.
///
/// Fetches snapshots from, and sends mutations to, the bot's control API
/// using the synchronous `ureq` HTTP client. Each call makes exactly one
/// request: there is no retry or backoff, a failure is returned to the
/// caller and the next poll tries again.
///
/// [`ControlApi`] is the seam the dashboard is written against, so engines
/// can be exercised without a server.
pub mod error;
pub mod types;

use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use error::{Error, Result};
pub use types::{ActionResponse, NewUser, Role, StatusSnapshot, User};

use crate::config::schema::ServerConfig;
use crate::events::EventLog;
use crate::settings::ConfigSnapshot;
use types::PasswordChange;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Service lifecycle actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
}

impl ServiceAction {
    pub fn path(self) -> &'static str {
        match self {
            Self::Start => "/start",
            Self::Stop => "/stop",
            Self::Restart => "/restart",
        }
    }
}

/// Operations offered by the control API.
///
/// Mutations return the server's message on `status == "success"` and
/// [`Error::Rejected`] for any other status.
pub trait ControlApi {
    fn status(&self) -> Result<StatusSnapshot>;
    fn config(&self) -> Result<ConfigSnapshot>;
    fn save_config(&self, snapshot: &ConfigSnapshot) -> Result<String>;
    /// Raw text of the most recent `limit` log lines.
    fn logs(&self, limit: usize) -> Result<String>;
    fn users(&self) -> Result<Vec<User>>;
    fn add_user(&self, user: &NewUser) -> Result<String>;
    fn delete_user(&self, id: u64) -> Result<String>;
    fn change_password(&self, id: u64, password: &str) -> Result<String>;
    fn service(&self, action: ServiceAction) -> Result<String>;
    /// Toggle a feature flag by its short key.
    fn toggle_feature(&self, short_key: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Synchronous HTTP implementation of [`ControlApi`].
#[derive(Debug)]
pub struct HttpClient {
    agent: ureq::Agent,
    base_url: String,
    session_cookie: Option<String>,
    events: EventLog,
}

impl HttpClient {
    /// Build a client from the resolved config.
    pub fn from_config(config: &ServerConfig, events: EventLog) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build();
        Self {
            agent,
            base_url: config.url.trim_end_matches('/').to_string(),
            session_cookie: config.session_cookie.clone(),
            events,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let url = format!("{}{}", self.base_url, path);
        let req = self.agent.request(method, &url);
        match &self.session_cookie {
            Some(cookie) => req.set("Cookie", cookie),
            None => req,
        }
    }

    /// Run a request, log its outcome and classify failures.
    fn send(
        &self,
        endpoint: &str,
        call: impl FnOnce() -> std::result::Result<ureq::Response, ureq::Error>,
    ) -> Result<ureq::Response> {
        let started = Instant::now();
        let result = call();
        let latency_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(resp) => {
                self.events.api_call(endpoint, true, latency_ms, "");
                Ok(resp)
            }
            Err(err) => {
                let err = classify(endpoint, err);
                self.events.api_call(endpoint, false, latency_ms, err.to_string());
                Err(err)
            }
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let endpoint = format!("GET {path}");
        let resp = self.send(&endpoint, || self.request("GET", path).call())?;
        decode(&endpoint, resp)
    }

    fn action(&self, method: &str, path: &str) -> Result<String> {
        let endpoint = format!("{method} {path}");
        let resp = self.send(&endpoint, || self.request(method, path).call())?;
        decode::<ActionResponse>(&endpoint, resp)?.into_result(&endpoint)
    }

    fn action_with_body<B: Serialize>(&self, method: &str, path: &str, body: &B) -> Result<String> {
        let endpoint = format!("{method} {path}");
        let resp = self.send(&endpoint, || self.request(method, path).send_json(body))?;
        decode::<ActionResponse>(&endpoint, resp)?.into_result(&endpoint)
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, resp: ureq::Response) -> Result<T> {
    resp.into_json().map_err(|source| Error::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// Map a `ureq` failure onto the error taxonomy.
///
/// A non-2xx reply that still carries a `{status, message}` body is the
/// server refusing the request, so it becomes [`Error::Rejected`] with the
/// server's message.
fn classify(endpoint: &str, err: ureq::Error) -> Error {
    match err {
        ureq::Error::Status(status, resp) => match resp.into_json::<ActionResponse>() {
            Ok(body) if !body.message.is_empty() => Error::Rejected {
                endpoint: endpoint.to_string(),
                message: body.message,
            },
            _ => Error::Http {
                endpoint: endpoint.to_string(),
                status,
            },
        },
        ureq::Error::Transport(transport) => Error::Transport {
            endpoint: endpoint.to_string(),
            message: transport.to_string(),
        },
    }
}

impl ControlApi for HttpClient {
    fn status(&self) -> Result<StatusSnapshot> {
        self.get_json("/status")
    }

    fn config(&self) -> Result<ConfigSnapshot> {
        self.get_json("/config")
    }

    fn save_config(&self, snapshot: &ConfigSnapshot) -> Result<String> {
        self.action_with_body("POST", "/config", snapshot)
    }

    /// A 404 means the service has not written a log yet and reads as an
    /// empty window.
    fn logs(&self, limit: usize) -> Result<String> {
        let path = format!("/logs?limit={limit}");
        let endpoint = format!("GET {path}");
        let resp = match self.send(&endpoint, || self.request("GET", &path).call()) {
            Ok(resp) => resp,
            Err(Error::Http { status: 404, .. }) => return Ok(String::new()),
            Err(err) => return Err(err),
        };
        resp.into_string().map_err(|source| Error::Decode { endpoint, source })
    }

    fn users(&self) -> Result<Vec<User>> {
        self.get_json("/users")
    }

    fn add_user(&self, user: &NewUser) -> Result<String> {
        self.action_with_body("POST", "/users", user)
    }

    fn delete_user(&self, id: u64) -> Result<String> {
        self.action("DELETE", &format!("/users/{id}"))
    }

    fn change_password(&self, id: u64, password: &str) -> Result<String> {
        self.action_with_body("PUT", &format!("/users/{id}"), &PasswordChange { password })
    }

    fn service(&self, action: ServiceAction) -> Result<String> {
        self.action("POST", action.path())
    }

    fn toggle_feature(&self, short_key: &str) -> Result<String> {
        self.action("POST", &format!("/toggle_feature/{short_key}"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
