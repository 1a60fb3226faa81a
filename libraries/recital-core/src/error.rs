//! Core error types for Recital
use thiserror::Error;

/// Result type alias using `RecitalError`
pub type Result<T> = std::result::Result<T, RecitalError>;

/// Core error type for Recital
///
/// Returned by the collaborator traits (`SpeechEngine`, `PositionStore`).
/// The reading controller never propagates these to its caller; it folds them
/// into state transitions and reported events.
#[derive(Error, Debug)]
pub enum RecitalError {
    /// The synthesis engine rejected or failed an utterance
    #[error("Engine error: {0}")]
    Engine(String),

    /// No synthesis capability is present
    #[error("Speech engine unavailable")]
    EngineUnavailable,

    /// Snapshot persistence failed
    #[error("Store error: {0}")]
    Store(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl RecitalError {
    /// Create an engine error
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
