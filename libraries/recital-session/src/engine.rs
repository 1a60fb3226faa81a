//! Simulated speech engine paced by wall time
//!
//! Produces the same event stream as a real synthesis engine (start, one
//! boundary per word, end) at a fixed character rate, without audio. Used by
//! the terminal reader and in tests.

use recital_core::error::{RecitalError, Result};
use recital_core::traits::{EngineEvent, EngineEventKind, SpeechEngine};
use recital_core::types::{Utterance, VoiceInfo};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Characters per second at rate 1.0
pub const DEFAULT_ENGINE_CHARS_PER_SECOND: f64 = 15.0;

/// Speech engine that "speaks" by sleeping
#[derive(Debug)]
pub struct PacedEngine {
    chars_per_second: f64,
    voices: Vec<VoiceInfo>,
    events: mpsc::UnboundedSender<EngineEvent>,
    current: Option<JoinHandle<()>>,
}

impl PacedEngine {
    /// Create an engine and the receiver its events arrive on
    pub fn new(chars_per_second: f64) -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let chars_per_second = if chars_per_second.is_finite() && chars_per_second > 0.0 {
            chars_per_second
        } else {
            DEFAULT_ENGINE_CHARS_PER_SECOND
        };

        (
            Self {
                chars_per_second,
                voices: Vec::new(),
                events,
                current: None,
            },
            rx,
        )
    }

    /// Offer these voices
    #[must_use]
    pub fn with_voices(mut self, voices: Vec<VoiceInfo>) -> Self {
        self.voices = voices;
        self
    }

    fn abort_current(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.abort();
        }
    }
}

impl SpeechEngine for PacedEngine {
    fn voices(&self) -> Vec<VoiceInfo> {
        self.voices.clone()
    }

    fn speak(&mut self, utterance: Utterance) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| RecitalError::engine(format!("no async runtime: {e}")))?;

        self.abort_current();

        let cps = self.chars_per_second * f64::from(utterance.rate.max(0.1));
        let per_char = Duration::from_secs_f64(1.0 / cps);
        let words = word_starts(&utterance.text);
        let total = utterance.text.chars().count();
        let events = self.events.clone();
        let id = utterance.id;

        self.current = Some(runtime.spawn(async move {
            let send = |kind| events.send(EngineEvent::new(id, kind)).is_ok();
            if !send(EngineEventKind::Start) {
                return;
            }

            let mut spoken = 0;
            for start in words {
                tokio::time::sleep(per_char * (start - spoken) as u32).await;
                spoken = start;
                if !send(EngineEventKind::Boundary { char_offset: start }) {
                    return;
                }
            }

            tokio::time::sleep(per_char * (total - spoken) as u32).await;
            send(EngineEventKind::End);
        }));

        Ok(())
    }

    fn cancel(&mut self) {
        self.abort_current();
    }
}

impl Drop for PacedEngine {
    fn drop(&mut self) {
        self.abort_current();
    }
}

/// Character offsets where words start
fn word_starts(text: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut in_word = false;

    for (offset, c) in text.chars().enumerate() {
        let is_word = !c.is_whitespace();
        if is_word && !in_word {
            starts.push(offset);
        }
        in_word = is_word;
    }

    starts
}
