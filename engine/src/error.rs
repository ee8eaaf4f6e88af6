//! Error types for the Stash engine.

use crate::RecordId;
use thiserror::Error;

/// All possible errors from the Stash engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Validation errors
    #[error("record already exists: {0}")]
    DuplicateRecord(RecordId),

    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    #[error("record was deleted and its id cannot be reused: {0}")]
    RecordDeleted(RecordId),

    // Persistence errors
    #[error("local storage failed: {0}")]
    Persistence(String),

    #[error("could not decode stored data: {0}")]
    Codec(String),

    // Remote errors
    #[error("remote store is unavailable")]
    RemoteUnavailable,

    #[error("remote operation failed: {message}")]
    Remote { message: String, retryable: bool },

    // State errors
    #[error("engine is offline")]
    Offline,

    #[error("another sync operation is already running")]
    SyncInProgress,
}

impl Error {
    /// Build a remote error that is worth retrying.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            retryable: true,
        }
    }

    /// Build a remote error that will fail the same way if retried.
    pub fn remote_fatal(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            retryable: false,
        }
    }

    /// Whether a retry of the failed remote call could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Remote { retryable, .. } => *retryable,
            Error::RemoteUnavailable => true,
            _ => false,
        }
    }

    /// Errors the UI should show to the user. Local failures are recovered
    /// silently and offline mode is not an error from the user's point of view.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Error::Remote { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Codec(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
