//! Reader playback state
use serde::{Deserialize, Serialize};
use std::fmt;

/// Playback state of the reading controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReaderState {
    /// No session
    #[default]
    Idle,

    /// Engine is synthesizing the sentence under the cursor (or the chain is
    /// waiting out a settle/meditation delay before the next one)
    Speaking,

    /// Session exists, engine idle, cursor fixed
    Paused,

    /// Cursor advanced past the last sentence
    Finished,
}

impl ReaderState {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Speaking => "speaking",
            Self::Paused => "paused",
            Self::Finished => "finished",
        }
    }

    /// Whether a session is live (speaking or paused)
    pub fn has_session(&self) -> bool {
        matches!(self, Self::Speaking | Self::Paused)
    }
}

impl fmt::Display for ReaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
