use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Why a control API request failed.
///
/// `Transport`, `Http` and `Decode` mean the server's answer never arrived
/// in usable form. `Rejected` means the server answered and refused.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    #[error("{endpoint}: HTTP {status}")]
    Http { endpoint: String, status: u16 },

    #[error("{endpoint}: invalid response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Rejected { endpoint: String, message: String },
}

impl Error {
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Transport { endpoint, .. }
            | Self::Http { endpoint, .. }
            | Self::Decode { endpoint, .. }
            | Self::Rejected { endpoint, .. } => endpoint,
        }
    }

    /// The server answered with a non-success `status`.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_displays_server_message() {
        let err = Error::Rejected {
            endpoint: "POST /start".into(),
            message: "Bot is already running.".into(),
        };
        assert_eq!(err.to_string(), "Bot is already running.");
        assert!(err.is_rejection());
        assert_eq!(err.endpoint(), "POST /start");
    }

    #[test]
    fn http_error_names_endpoint() {
        let err = Error::Http {
            endpoint: "GET /users".into(),
            status: 502,
        };
        assert_eq!(err.to_string(), "GET /users: HTTP 502");
        assert!(!err.is_rejection());
    }
}
