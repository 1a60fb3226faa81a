//! ID types for Recital entities
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of hex digits of the content hash kept in derived document IDs
const TEXT_ID_HEX_LEN: usize = 16;

/// Document identifier
///
/// Keys position snapshots. Callers that manage their own documents pass an
/// explicit ID; plain text without an identity gets one derived from its
/// content, so the same text resumes where it stopped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create a new document ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive a stable document ID from text content
    pub fn for_text(text: &str) -> Self {
        let digest = format!("{:x}", Sha256::digest(text.as_bytes()));
        Self(format!("text:{}", &digest[..TEXT_ID_HEX_LEN]))
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Utterance handle
///
/// Issued from a monotonically increasing generation counter. An event tagged
/// with anything but the currently active handle is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtteranceId(u64);

impl UtteranceId {
    /// Create an utterance ID from a raw generation number
    pub fn new(generation: u64) -> Self {
        Self(generation)
    }

    /// Get the generation number
    pub fn generation(self) -> u64 {
        self.0
    }

    /// The handle issued after this one
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "utt#{}", self.0)
    }
}

/// Timer token handed to a `Scheduler`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerToken(u64);

impl TimerToken {
    /// Create a timer token from a raw value
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value
    pub fn value(self) -> u64 {
        self.0
    }

    /// The token issued after this one
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}
