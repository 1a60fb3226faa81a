//! Error types for the reading controller

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures reported by the reading controller
///
/// These never cross the controller boundary as a `Result`. Commands return
/// `()` and failures are pushed as `ReaderEvent::Error`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PlaybackError {
    /// Document has no speakable sentences
    #[error("Nothing to read: the document has no sentences")]
    NoSentences,

    /// No speech synthesis capability is present
    #[error("Speech engine unavailable")]
    EngineUnavailable,

    /// The engine failed an utterance; the chain stops
    #[error("Speech engine error at sentence {sentence_index}: {message}")]
    Engine {
        /// Sentence that was being spoken
        sentence_index: usize,
        /// Engine-provided description
        message: String,
    },

    /// Loading or saving a position snapshot failed
    #[error("Position store error: {0}")]
    Store(String),
}

impl PlaybackError {
    /// Whether the error is only worth a warning (reading can continue)
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

impl From<recital_core::RecitalError> for PlaybackError {
    fn from(err: recital_core::RecitalError) -> Self {
        match err {
            recital_core::RecitalError::EngineUnavailable => Self::EngineUnavailable,
            other => Self::Store(other.to_string()),
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;
    use recital_core::RecitalError;

    #[test]
    fn store_errors_are_warnings() {
        assert!(PlaybackError::Store("disk full".into()).is_warning());
        assert!(!PlaybackError::NoSentences.is_warning());
        assert!(!PlaybackError::Engine {
            sentence_index: 0,
            message: "boom".into()
        }
        .is_warning());
    }

    #[test]
    fn converts_core_errors() {
        assert_eq!(
            PlaybackError::from(RecitalError::EngineUnavailable),
            PlaybackError::EngineUnavailable
        );
        assert!(matches!(
            PlaybackError::from(RecitalError::store("locked")),
            PlaybackError::Store(msg) if msg.contains("locked")
        ));
    }

    #[test]
    fn engine_error_message() {
        let err = PlaybackError::Engine {
            sentence_index: 3,
            message: "synthesis-failed".into(),
        };
        assert_eq!(
            err.to_string(),
            "Speech engine error at sentence 3: synthesis-failed"
        );
    }
}
