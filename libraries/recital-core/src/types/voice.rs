//! Voice parameters
use serde::{Deserialize, Serialize};

/// Minimum speaking rate
pub const MIN_RATE: f32 = 0.1;
/// Maximum speaking rate
pub const MAX_RATE: f32 = 2.0;
/// Minimum pitch
pub const MIN_PITCH: f32 = 0.5;
/// Maximum pitch
pub const MAX_PITCH: f32 = 2.0;

/// Voice parameters applied to every utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceParams {
    /// Selected engine voice name (None = let the engine/selection decide)
    pub voice: Option<String>,

    /// Speaking rate (0.1 - 2.0, default: 1.0)
    pub rate: f32,

    /// Pitch (0.5 - 2.0, default: 1.0)
    pub pitch: f32,

    /// Volume (0.0 - 1.0, default: 1.0)
    pub volume: f32,

    /// Language tag (e.g. "pt-BR")
    pub language: Option<String>,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            voice: None,
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            language: None,
        }
    }
}

impl VoiceParams {
    /// Set the rate, clamped to 0.1 - 2.0
    #[must_use]
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = clamp_or(rate, MIN_RATE, MAX_RATE, 1.0);
        self
    }

    /// Set the pitch, clamped to 0.5 - 2.0
    #[must_use]
    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = clamp_or(pitch, MIN_PITCH, MAX_PITCH, 1.0);
        self
    }

    /// Set the volume, clamped to 0.0 - 1.0
    #[must_use]
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = clamp_or(volume, 0.0, 1.0, 1.0);
        self
    }

    /// Apply a partial update, clamping every provided value
    pub fn apply(&mut self, update: &VoiceParamsUpdate) {
        if let Some(ref voice) = update.voice {
            self.voice = voice.clone();
        }
        if let Some(rate) = update.rate {
            self.rate = clamp_or(rate, MIN_RATE, MAX_RATE, self.rate);
        }
        if let Some(pitch) = update.pitch {
            self.pitch = clamp_or(pitch, MIN_PITCH, MAX_PITCH, self.pitch);
        }
        if let Some(volume) = update.volume {
            self.volume = clamp_or(volume, 0.0, 1.0, self.volume);
        }
        if let Some(ref language) = update.language {
            self.language = language.clone();
        }
    }

    /// Copy with every field forced into its valid range
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            voice: self.voice.clone(),
            rate: clamp_or(self.rate, MIN_RATE, MAX_RATE, 1.0),
            pitch: clamp_or(self.pitch, MIN_PITCH, MAX_PITCH, 1.0),
            volume: clamp_or(self.volume, 0.0, 1.0, 1.0),
            language: self.language.clone(),
        }
    }
}

/// Partial voice parameter update
///
/// `None` leaves a field unchanged. For `voice` and `language`,
/// `Some(None)` clears the selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceParamsUpdate {
    /// Set or clear the voice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<Option<String>>,

    /// Set the rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f32>,

    /// Set the pitch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f32>,

    /// Set the volume
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,

    /// Set or clear the language tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Option<String>>,
}

/// A voice offered by an engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// Engine-specific voice name
    pub name: String,

    /// Language tag the voice speaks
    pub language: String,

    /// Whether the engine marks this as its default voice
    pub is_default: bool,
}

impl VoiceInfo {
    /// Create a voice description
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
            is_default: false,
        }
    }

    /// Whether the voice language starts with `prefix` (case-insensitive)
    pub fn speaks(&self, prefix: &str) -> bool {
        self.language
            .to_ascii_lowercase()
            .starts_with(&prefix.to_ascii_lowercase())
    }
}

/// Clamp to `[min, max]`, falling back when the value is NaN
fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}
