//! Failure taxonomy for a single source fetch

use thiserror::Error;

/// Why a fetch did not produce a snapshot.
///
/// Every variant collapses into the same `Error` status on the source; the
/// variant is kept only so it can be logged and shown next to stale data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request never completed (connect failure, timeout, broken body).
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered with a non-success status.
    #[error("HTTP error: {status}")]
    Http { status: u16 },

    /// The body was not JSON or lacked the fields we need.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl FetchError {
    pub fn parse(msg: impl Into<String>) -> Self {
        FetchError::Parse(msg.into())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Http {
                status: status.as_u16(),
            }
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            FetchError::Http { status: 500 }.to_string(),
            "HTTP error: 500"
        );
        assert_eq!(
            FetchError::parse("missing field `rates`").to_string(),
            "Parse error: missing field `rates`"
        );
    }

    #[test]
    fn test_json_error_is_parse() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(FetchError::from(err), FetchError::Parse(_)));
    }
}
