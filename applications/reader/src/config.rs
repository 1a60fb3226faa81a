/// Reader configuration
use crate::error::{ReaderError, Result};
use recital_core::types::VoiceParams;
use recital_playback::ControllerSettings;
use recital_session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "recital.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub voice: VoiceSettings,

    #[serde(default)]
    pub playback: PlaybackSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub engine: EngineSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VoiceSettings {
    #[serde(default = "default_multiplier")]
    pub rate: f32,

    #[serde(default = "default_multiplier")]
    pub pitch: f32,

    #[serde(default = "default_multiplier")]
    pub volume: f32,

    #[serde(default)]
    pub voice: Option<String>,

    #[serde(default)]
    pub language: Option<String>,

    /// Language prefix used to pick a default voice
    #[serde(default)]
    pub preferred_language: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default)]
    pub meditation_enabled: bool,

    #[serde(default = "default_meditation_pause_secs")]
    pub meditation_pause_secs: f64,

    #[serde(default = "default_chars_per_second")]
    pub default_chars_per_second: f64,

    #[serde(default = "default_eta_tick_ms")]
    pub eta_tick_ms: u64,

    #[serde(default = "default_checkpoint_secs")]
    pub checkpoint_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_autosave_debounce_secs")]
    pub autosave_debounce_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineSettings {
    /// Pace of the simulated engine at rate 1.0
    #[serde(default = "default_chars_per_second")]
    pub chars_per_second: f64,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `recital.toml` is read when
    /// present. `RECITAL_<SECTION>__<KEY>` variables override both.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (prefixed with RECITAL_)
        settings = settings.add_source(
            config::Environment::with_prefix("RECITAL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ReaderError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ReaderError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let voice = &self.voice;
        if !(0.1..=2.0).contains(&voice.rate) {
            return Err(ReaderError::Config(format!(
                "voice.rate must be between 0.1 and 2.0 (got {})",
                voice.rate
            )));
        }
        if !(0.5..=2.0).contains(&voice.pitch) {
            return Err(ReaderError::Config(format!(
                "voice.pitch must be between 0.5 and 2.0 (got {})",
                voice.pitch
            )));
        }
        if !(0.0..=1.0).contains(&voice.volume) {
            return Err(ReaderError::Config(format!(
                "voice.volume must be between 0.0 and 1.0 (got {})",
                voice.volume
            )));
        }

        let playback = &self.playback;
        if !playback.meditation_pause_secs.is_finite() || playback.meditation_pause_secs < 0.0 {
            return Err(ReaderError::Config(
                "playback.meditation_pause_secs must be a non-negative number".to_string(),
            ));
        }
        if !is_positive(playback.default_chars_per_second) {
            return Err(ReaderError::Config(
                "playback.default_chars_per_second must be positive".to_string(),
            ));
        }
        if playback.eta_tick_ms == 0 || playback.checkpoint_secs == 0 {
            return Err(ReaderError::Config(
                "playback.eta_tick_ms and playback.checkpoint_secs must be positive".to_string(),
            ));
        }

        if self.storage.database_url.is_empty() {
            return Err(ReaderError::Config(
                "storage.database_url is required (set RECITAL_STORAGE__DATABASE_URL)".to_string(),
            ));
        }

        if !is_positive(self.engine.chars_per_second) {
            return Err(ReaderError::Config(
                "engine.chars_per_second must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Settings for the reading controller
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            voice: VoiceParams {
                voice: self.voice.voice.clone(),
                rate: self.voice.rate,
                pitch: self.voice.pitch,
                volume: self.voice.volume,
                language: self.voice.language.clone(),
            },
            preferred_language: self.voice.preferred_language.clone(),
            settle_delay_ms: self.playback.settle_delay_ms,
            meditation_enabled: self.playback.meditation_enabled,
            meditation_pause_secs: self.playback.meditation_pause_secs,
            default_chars_per_second: self.playback.default_chars_per_second,
        }
    }

    /// Timing of the session loop
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            eta_tick: Duration::from_millis(self.playback.eta_tick_ms),
            checkpoint_interval: Duration::from_secs(self.playback.checkpoint_secs),
            autosave_debounce: Duration::from_secs(self.storage.autosave_debounce_secs),
            ..SessionConfig::default()
        }
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

// Default values
fn default_multiplier() -> f32 {
    1.0
}

fn default_settle_delay_ms() -> u64 {
    250
}

fn default_meditation_pause_secs() -> f64 {
    5.0
}

fn default_chars_per_second() -> f64 {
    15.0
}

fn default_eta_tick_ms() -> u64 {
    1000
}

fn default_checkpoint_secs() -> u64 {
    30
}

fn default_database_url() -> String {
    "sqlite://recital.db".to_string()
}

fn default_autosave_debounce_secs() -> u64 {
    10
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            rate: default_multiplier(),
            pitch: default_multiplier(),
            volume: default_multiplier(),
            voice: None,
            language: None,
            preferred_language: None,
        }
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            meditation_enabled: false,
            meditation_pause_secs: default_meditation_pause_secs(),
            default_chars_per_second: default_chars_per_second(),
            eta_tick_ms: default_eta_tick_ms(),
            checkpoint_secs: default_checkpoint_secs(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            autosave_debounce_secs: default_autosave_debounce_secs(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            chars_per_second: default_chars_per_second(),
        }
    }
}
