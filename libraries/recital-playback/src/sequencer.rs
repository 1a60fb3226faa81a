//! Utterance sequencing
//!
//! Wraps a [`SpeechEngine`] so that at most one utterance is live at a time.
//! Every utterance gets a fresh [`UtteranceId`] from a generation counter;
//! engine events tagged with anything but the active id are dropped.

use recital_core::traits::{EngineEvent, EngineEventKind, SpeechEngine};
use recital_core::types::{Sentence, Utterance, UtteranceId, VoiceInfo, VoiceParams};
use std::time::Instant;

use crate::error::PlaybackError;

/// The utterance the engine is currently working on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveUtterance {
    id: UtteranceId,
    sentence_index: usize,
    issued_at: Instant,
}

/// Engine event that belongs to the active utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedEvent {
    /// Sentence the utterance speaks
    pub sentence_index: usize,
    /// What happened
    pub kind: EngineEventKind,
}

/// Issues utterances and filters engine events by generation
pub struct UtteranceSequencer {
    engine: Box<dyn SpeechEngine>,
    last_issued: UtteranceId,
    active: Option<ActiveUtterance>,
}

impl UtteranceSequencer {
    /// Wrap an engine
    pub fn new(engine: Box<dyn SpeechEngine>) -> Self {
        Self {
            engine,
            last_issued: UtteranceId::new(0),
            active: None,
        }
    }

    /// Whether the engine can speak at all
    pub fn is_available(&self) -> bool {
        self.engine.is_available()
    }

    /// Voices the engine offers
    pub fn voices(&self) -> Vec<VoiceInfo> {
        self.engine.voices()
    }

    /// Speak one sentence, cancelling whatever the engine has in flight
    ///
    /// A synchronous refusal by the engine is reported the same way as an
    /// `Error` event for that sentence.
    pub fn speak(
        &mut self,
        sentence_index: usize,
        sentence: &Sentence,
        params: &VoiceParams,
        now: Instant,
    ) -> Result<UtteranceId, PlaybackError> {
        self.cancel();

        let id = self.last_issued.next();
        self.last_issued = id;

        let utterance = self.build_utterance(id, sentence, params);
        tracing::debug!(
            "Speaking sentence {} as {} ({} chars)",
            sentence_index,
            id,
            sentence.char_len()
        );

        self.engine
            .speak(utterance)
            .map_err(|e| PlaybackError::Engine {
                sentence_index,
                message: e.to_string(),
            })?;

        self.active = Some(ActiveUtterance {
            id,
            sentence_index,
            issued_at: now,
        });

        Ok(id)
    }

    /// Cancel the active utterance
    ///
    /// The engine is told to cancel even when nothing is tracked locally, since
    /// its own queue may lag behind.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            tracing::trace!("Cancelling {}", active.id);
        }
        self.engine.cancel();
    }

    /// Filter an engine event
    ///
    /// Returns `None` for stale events. A terminal event clears the active
    /// utterance.
    pub fn accept(&mut self, event: EngineEvent) -> Option<AcceptedEvent> {
        match self.active {
            Some(active) if active.id == event.utterance => {
                if event.kind.is_terminal() {
                    self.active = None;
                }
                Some(AcceptedEvent {
                    sentence_index: active.sentence_index,
                    kind: event.kind,
                })
            }
            _ => {
                tracing::trace!("Discarding stale event for {}: {:?}", event.utterance, event.kind);
                None
            }
        }
    }

    /// The active utterance, if any
    pub fn active(&self) -> Option<UtteranceId> {
        self.active.map(|active| active.id)
    }

    /// When the active utterance was issued
    pub fn active_since(&self) -> Option<Instant> {
        self.active.map(|active| active.issued_at)
    }

    /// The last handle issued
    pub fn last_issued(&self) -> UtteranceId {
        self.last_issued
    }

    fn build_utterance(&self, id: UtteranceId, sentence: &Sentence, params: &VoiceParams) -> Utterance {
        let params = params.normalized();
        let known = params.voice.as_ref().and_then(|name| {
            self.engine
                .voices()
                .into_iter()
                .find(|voice| &voice.name == name)
        });

        // Engines that ignore voice objects still honour the language tag
        let language = params
            .language
            .clone()
            .or_else(|| known.as_ref().map(|voice| voice.language.clone()));
        let voice = if self.engine.honors_voice_selection() {
            known.map(|voice| voice.name)
        } else {
            None
        };

        Utterance {
            id,
            text: sentence.spoken_text().to_string(),
            voice,
            language,
            rate: params.rate,
            pitch: params.pitch,
            volume: params.volume,
        }
    }
}

impl std::fmt::Debug for UtteranceSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UtteranceSequencer")
            .field("last_issued", &self.last_issued)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
