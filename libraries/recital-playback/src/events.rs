//! Reader Events
//!
//! Event-based communication between the reading controller and whoever drives
//! it (a UI, the session runtime, a CLI). Events are emitted at key points:
//! - State changes (play/pause/stop/finish)
//! - Cursor moves and sentence starts
//! - Word boundaries inside the current sentence
//! - ETA label changes (only while an estimate is requested)
//! - Persistence hooks (pause, stop, advance, finish, close, periodic)

use recital_core::types::{DocumentId, PositionSnapshot, ReaderState};
use serde::{Deserialize, Serialize};

use crate::error::PlaybackError;
use crate::types::PersistTrigger;

/// Events emitted by the reading controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReaderEvent {
    /// A document was segmented
    SentencesChanged {
        /// Document the sentences belong to
        document: DocumentId,
        /// Number of sentences
        count: usize,
    },

    /// Controller state changed
    StateChanged {
        /// The new state
        state: ReaderState,
        /// The state before the change
        previous: ReaderState,
    },

    /// Cursor moved
    CursorChanged {
        /// New cursor (equals the sentence count when finished)
        index: usize,
        /// Previous cursor
        previous: usize,
    },

    /// Engine started speaking a sentence
    SentenceStarted {
        /// Sentence index
        index: usize,
    },

    /// Engine reached a boundary inside the current sentence
    Boundary {
        /// Sentence index
        index: usize,
        /// Character offset into the sentence
        char_offset: usize,
    },

    /// Remaining-time estimate changed
    EtaUpdated {
        /// Formatted label (`M:SS` or `H:MM`)
        label: String,
        /// Raw estimate in milliseconds
        remaining_ms: u64,
    },

    /// Voice selection changed
    VoiceChanged {
        /// Selected voice name
        voice: Option<String>,
    },

    /// The position should be persisted
    PersistRequested {
        /// What caused the request
        trigger: PersistTrigger,
        /// Position to save
        snapshot: PositionSnapshot,
    },

    /// The persisted position for a document should be removed
    SnapshotCleared {
        /// Document whose snapshot is cleared
        document: DocumentId,
    },

    /// Something went wrong
    Error {
        /// What failed
        error: PlaybackError,
    },
}

impl ReaderEvent {
    /// Short name of the event, for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::SentencesChanged { .. } => "sentences_changed",
            Self::StateChanged { .. } => "state_changed",
            Self::CursorChanged { .. } => "cursor_changed",
            Self::SentenceStarted { .. } => "sentence_started",
            Self::Boundary { .. } => "boundary",
            Self::EtaUpdated { .. } => "eta_updated",
            Self::VoiceChanged { .. } => "voice_changed",
            Self::PersistRequested { .. } => "persist_requested",
            Self::SnapshotCleared { .. } => "snapshot_cleared",
            Self::Error { .. } => "error",
        }
    }
}
