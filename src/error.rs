//! Error types for gandi-ddns.

use thiserror::Error;

/// Result type alias for gandi-ddns.
pub type Result<T> = std::result::Result<T, DdnsError>;

/// DDNS error types.
#[derive(Error, Debug)]
pub enum DdnsError {
    /// A required configuration key is absent.
    #[error("Missing configuration value {0}")]
    MissingConfig(String),

    /// A configuration value is present but unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection or transfer failure underneath an HTTP call.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The IP echo endpoint could not tell us our address.
    #[error("IP resolution failed: {0}")]
    Resolution(String),

    /// The LiveDNS API rejected a call, or could not be reached.
    #[error("Gandi API error: {message}")]
    Api {
        status: Option<u16>,
        message: String,
    },

    /// Error status whose body carries no JSON `message`.
    #[error("Gandi API returned {status}: {body}")]
    UnexpectedResponse { status: u16, body: String },

    /// A 200 record read without a usable `rrset_values` entry.
    #[error("Malformed record response: {0}")]
    MalformedRecord(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DdnsError {
    /// Reframe a transport failure as a provider call failure.
    pub fn into_api(self) -> Self {
        match self {
            DdnsError::Transport(message) => DdnsError::Api {
                status: None,
                message,
            },
            other => other,
        }
    }
}

impl From<reqwest::Error> for DdnsError {
    fn from(e: reqwest::Error) -> Self {
        DdnsError::Transport(e.to_string())
    }
}

impl From<toml::de::Error> for DdnsError {
    fn from(e: toml::de::Error) -> Self {
        DdnsError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for DdnsError {
    fn from(e: serde_json::Error) -> Self {
        DdnsError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_api_wraps_transport() {
        let err = DdnsError::Transport("connection refused".to_string()).into_api();
        match err {
            DdnsError::Api { status, message } => {
                assert_eq!(status, None);
                assert_eq!(message, "connection refused");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_into_api_keeps_other_errors() {
        let err = DdnsError::MissingConfig("GANDI_DDNS_TTL".to_string()).into_api();
        assert!(matches!(err, DdnsError::MissingConfig(_)));
    }
}
