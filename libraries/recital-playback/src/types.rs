//! Core types for the reading controller

use recital_core::types::{DocumentId, ReaderState, VoiceParams};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::timing::DEFAULT_CHARS_PER_SECOND;

/// Configuration for the reading controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Initial voice parameters
    pub voice: VoiceParams,

    /// Language prefix used to pick a voice when none is selected (e.g. "en")
    pub preferred_language: Option<String>,

    /// Delay between one sentence's end and the next speak (default: 250ms)
    pub settle_delay_ms: u64,

    /// Insert a pause between sentences (default: false)
    pub meditation_enabled: bool,

    /// Length of the meditation pause in seconds (default: 5.0)
    pub meditation_pause_secs: f64,

    /// Throughput assumed before anything was measured (default: 15.0)
    pub default_chars_per_second: f64,
}

impl ControllerSettings {
    /// Settle delay as a duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Meditation pause as a duration (negative or non-finite values become zero)
    pub fn meditation_pause(&self) -> Duration {
        seconds(self.meditation_pause_secs)
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            voice: VoiceParams::default(),
            preferred_language: None,
            settle_delay_ms: 250,
            meditation_enabled: false,
            meditation_pause_secs: 5.0,
            default_chars_per_second: DEFAULT_CHARS_PER_SECOND,
        }
    }
}

/// Convert seconds to a duration, mapping garbage to zero
pub(crate) fn seconds(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    } else {
        Duration::ZERO
    }
}

/// Why the controller asks for its position to be persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistTrigger {
    /// Reading was paused
    Pause,

    /// Reading was stopped
    Stop,

    /// The cursor advanced to the next sentence
    Advance,

    /// The last sentence finished
    Finish,

    /// The reader is being closed
    Close,

    /// Periodic checkpoint while speaking
    Periodic,
}

impl PersistTrigger {
    /// Whether a save for this trigger should happen right away
    ///
    /// Advance and periodic requests are frequent and can be debounced.
    pub fn is_immediate(self) -> bool {
        !matches!(self, Self::Advance | Self::Periodic)
    }

    /// Get trigger name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Stop => "stop",
            Self::Advance => "advance",
            Self::Finish => "finish",
            Self::Close => "close",
            Self::Periodic => "periodic",
        }
    }
}

/// Snapshot of every observable of the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderStatus {
    /// Current document, if any
    pub document: Option<DocumentId>,

    /// Controller state
    pub state: ReaderState,

    /// Index of the current sentence (equals `sentence_count` when finished)
    pub cursor: usize,

    /// Number of sentences in the document
    pub sentence_count: usize,

    /// Sentence the engine last reported as started
    pub spoken_index: Option<usize>,

    /// Sentence restored from a saved snapshot
    pub saved_index: Option<usize>,

    /// Character offset of the last boundary inside the current sentence
    pub char_offset: usize,

    /// Most recent estimate label (empty until one is requested)
    pub eta_label: String,

    /// Current voice parameters
    pub voice: VoiceParams,

    /// Whether meditation pauses are enabled
    pub meditation_enabled: bool,
}
