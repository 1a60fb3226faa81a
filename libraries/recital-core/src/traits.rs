//! Core traits for Recital
use crate::error::Result;
use crate::types::{TimerToken, Utterance, UtteranceId, VoiceInfo};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Speech synthesis engine
///
/// Implementers turn utterances into audible output. The engine is
/// asynchronous and callback driven: `speak` only queues the request, and the
/// lifecycle of the utterance is reported later as [`EngineEvent`]s tagged with
/// `utterance.id`, delivered to whoever owns the reading controller.
///
/// Each utterance must produce exactly one terminal event (`End` or `Error`),
/// preceded by an optional `Start` and zero or more `Boundary` events. Events
/// for an utterance that was cancelled may still arrive; the caller discards
/// them.
pub trait SpeechEngine: Send {
    /// Whether any synthesis capability is present
    fn is_available(&self) -> bool {
        true
    }

    /// Voices the engine offers
    fn voices(&self) -> Vec<VoiceInfo> {
        Vec::new()
    }

    /// Whether the engine honours an explicit voice selection
    ///
    /// Some engines ignore the voice object and only respect the language
    /// tag. Those return `false` and receive utterances without a voice.
    fn honors_voice_selection(&self) -> bool {
        true
    }

    /// Queue an utterance
    ///
    /// # Errors
    /// Returns an error if the engine refuses the request outright
    fn speak(&mut self, utterance: Utterance) -> Result<()>;

    /// Cancel whatever the engine believes is active or queued
    ///
    /// Must not block waiting for the engine to confirm.
    fn cancel(&mut self);
}

/// Lifecycle event reported by a speech engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineEvent {
    /// Utterance the event belongs to
    pub utterance: UtteranceId,

    /// What happened
    pub kind: EngineEventKind,
}

impl EngineEvent {
    /// Create an engine event
    pub fn new(utterance: UtteranceId, kind: EngineEventKind) -> Self {
        Self { utterance, kind }
    }
}

/// Kind of engine event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEventKind {
    /// Audio for the utterance started
    Start,

    /// Engine reached a word/sentence boundary
    Boundary {
        /// Character offset into the utterance text
        char_offset: usize,
    },

    /// Utterance finished (terminal)
    End,

    /// Utterance failed (terminal)
    Error {
        /// Engine-provided description
        message: String,
    },
}

impl EngineEventKind {
    /// Whether this event ends the utterance
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End | Self::Error { .. })
    }
}

/// Delayed-callback scheduler
///
/// After `delay` the implementation must hand `token` back to the owner of
/// the reading controller, which forwards it to `handle_timer`. Cancelling a
/// token that already fired or was never scheduled is a no-op.
pub trait Scheduler: Send {
    /// Fire `token` after `delay`
    fn schedule(&mut self, delay: Duration, token: TimerToken);

    /// Drop a pending firing of `token`
    fn cancel(&mut self, token: TimerToken);
}

/// Monotonic time source
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> Instant;
}

/// Clock backed by `Instant::now`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
