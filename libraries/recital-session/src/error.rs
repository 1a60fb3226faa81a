//! Error types for the reading session
use thiserror::Error;

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session task has stopped
    #[error("Reading session is closed")]
    Closed,

    /// Position store error
    #[error(transparent)]
    Store(#[from] recital_core::RecitalError),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
