//! Error model used by Sayori and Jira client operations.

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

/// Failure to fetch or decode a record from one of the remote ticket services.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http {status}: {message}")]
    Http {
        status: StatusCode,
        code: Option<String>,
        message: String,
    },
    #[error("authentication error: {0}")]
    Authentication(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("unexpected error: {0}")]
    Other(String),
}

impl FetchError {
    /// Constructs an HTTP error variant with optional API-specific code.
    pub fn http(status: StatusCode, code: Option<String>, message: impl Into<String>) -> Self {
        FetchError::Http {
            status,
            code,
            message: message.into(),
        }
    }

    /// Whether a repeated attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout(_) | FetchError::Network(_) => true,
            FetchError::Http { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    /// Converts reqwest errors into semantic FetchError variants.
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if err.is_status() {
            let status = err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            FetchError::Http {
                status,
                code: None,
                message: err.to_string(),
            }
        } else if err.is_connect() || err.is_request() {
            FetchError::Network(err.to_string())
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::FetchError;
    use reqwest::StatusCode;

    #[test]
    fn server_errors_and_throttling_are_retryable() {
        assert!(FetchError::http(StatusCode::BAD_GATEWAY, None, "down").is_retryable());
        assert!(FetchError::http(StatusCode::TOO_MANY_REQUESTS, None, "slow").is_retryable());
        assert!(FetchError::Timeout("t".into()).is_retryable());
    }

    #[test]
    fn client_errors_are_final() {
        assert!(!FetchError::http(StatusCode::NOT_FOUND, None, "missing").is_retryable());
        assert!(!FetchError::Authentication("denied".into()).is_retryable());
        assert!(!FetchError::Decode("bad json".into()).is_retryable());
    }
}
