//! Client error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching from the API
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Retries exhausted after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    #[error("Invalid rate limit header {header}: {reason}")]
    RateLimitHeader { header: &'static str, reason: String },

    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ClientError {
    /// Check if every attempt was used up
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, ClientError::RetryExhausted { .. })
    }

    /// HTTP status for terminal status errors
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if the fetch loop retries this error in place
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retry_exhausted() {
        assert!(ClientError::RetryExhausted { attempts: 3 }.is_retry_exhausted());
        assert!(!ClientError::Timeout(Duration::from_secs(10)).is_retry_exhausted());
    }

    #[test]
    fn test_status() {
        let err = ClientError::Status {
            status: 403,
            body: "Forbidden".to_string(),
        };
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.to_string(), "HTTP error 403: Forbidden");
        assert_eq!(ClientError::InvalidArgument("x".into()).status(), None);
    }

    #[test]
    fn test_is_retryable() {
        assert!(ClientError::Timeout(Duration::from_secs(10)).is_retryable());
        assert!(
            !ClientError::Status {
                status: 500,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(!ClientError::RetryExhausted { attempts: 3 }.is_retryable());
    }
}
