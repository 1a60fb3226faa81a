//! Position snapshot for resuming a document later
use super::DocumentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted reading position
///
/// Serialized with camelCase keys and an RFC 3339 `capturedAt` timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSnapshot {
    /// Document this position belongs to
    pub document_identity: DocumentId,

    /// Sentence cursor at capture time
    pub sentence_index: usize,

    /// Character offset within the sentence at capture time
    pub character_offset: usize,

    /// When the snapshot was taken
    pub captured_at: DateTime<Utc>,
}

impl PositionSnapshot {
    /// Create a snapshot captured now
    pub fn new(document_identity: DocumentId, sentence_index: usize, character_offset: usize) -> Self {
        Self {
            document_identity,
            sentence_index,
            character_offset,
            captured_at: Utc::now(),
        }
    }

    /// Sentence index clamped to `[0, sentence_count - 1]`
    ///
    /// The text may have changed since the snapshot was taken. Returns `None`
    /// when there are no sentences to land on.
    pub fn clamped_index(&self, sentence_count: usize) -> Option<usize> {
        if sentence_count == 0 {
            None
        } else {
            Some(self.sentence_index.min(sentence_count - 1))
        }
    }

    /// Whether two snapshots point at the same place in the same document
    pub fn same_position(&self, other: &Self) -> bool {
        self.document_identity == other.document_identity
            && self.sentence_index == other.sentence_index
    }
}
