//! Utterance request handed to a speech engine
use super::UtteranceId;
use serde::{Deserialize, Serialize};

/// One synthesis request for exactly one sentence
///
/// Voice selection has already been resolved against the engine's
/// capabilities: `voice` is only set when the engine honours explicit voice
/// selection and knows the voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    /// Handle every engine event for this request must carry
    pub id: UtteranceId,

    /// Text to synthesize
    pub text: String,

    /// Engine voice name
    pub voice: Option<String>,

    /// BCP 47 language tag
    pub language: Option<String>,

    /// Speaking rate multiplier (0.1 - 2.0)
    pub rate: f32,

    /// Pitch multiplier (0.5 - 2.0)
    pub pitch: f32,

    /// Volume (0.0 - 1.0)
    pub volume: f32,
}
