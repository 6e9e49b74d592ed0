//! Scheduler error types

use thiserror::Error;

use crate::client::ClientError;

/// Failure captured in a task's result
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Task panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    /// The client error, if this failure came from the client
    pub fn client(&self) -> Option<&ClientError> {
        match self {
            TaskError::Client(e) => Some(e),
            TaskError::Panicked(_) => None,
        }
    }

    /// Check if the fetch ran out of attempts
    pub fn is_retry_exhausted(&self) -> bool {
        self.client().is_some_and(ClientError::is_retry_exhausted)
    }
}

/// Errors from scheduler lifecycle operations
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Worker is already running")]
    AlreadyRunning,

    #[error("Client is unavailable; the previous worker did not return it")]
    ClientUnavailable,

    #[error("Worker thread panicked")]
    WorkerPanicked,

    #[error("Failed to start worker: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Failed to build client: {0}")]
    Client(#[from] ClientError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_exhausted_passthrough() {
        let err = TaskError::from(ClientError::RetryExhausted { attempts: 3 });
        assert!(err.is_retry_exhausted());
        assert_eq!(err.to_string(), "Retries exhausted after 3 attempts");
    }

    #[test]
    fn test_panicked_has_no_client_error() {
        let err = TaskError::Panicked("boom".to_string());
        assert!(err.client().is_none());
        assert!(!err.is_retry_exhausted());
        assert_eq!(err.to_string(), "Task panicked: boom");
    }
}
