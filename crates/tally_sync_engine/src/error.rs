//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during session load and push operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The session does not exist, or is unreachable with no cached copy.
    #[error("session not found")]
    SessionNotFound,

    /// The caller's identity cannot access the session.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// A push attempt exceeded the configured timeout.
    #[error("push timed out")]
    Timeout,

    /// Durable cache store error.
    #[error("store error: {0}")]
    Storage(#[from] tally_storage::StorageError),
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Timeout => true,
            _ => false,
        }
    }
}
