//! Recital - Reading Controller
//!
//! Platform-agnostic sentence-sequenced speech playback.
//!
//! This crate provides:
//! - Sentence segmentation with lossless round-trip
//! - One-utterance-at-a-time sequencing with stale event filtering
//! - The reading state machine (play, pause, stop, reset, seek, next, previous)
//! - Settle and meditation delays between sentences
//! - Remaining-time estimation from measured throughput
//! - Persistence hooks for the caller's position store
//!
//! # Architecture
//!
//! `recital-playback` is completely platform-agnostic:
//! - No dependency on a synthesis backend
//! - No dependency on a timer runtime
//! - No dependency on recital-storage (database)
//!
//! The engine, scheduler and clock are injected through the traits in
//! `recital-core`. The controller is a synchronous reducer: feed it commands,
//! engine events and timer firings, then drain its events.
//!
//! # Example: Segmentation
//!
//! ```rust
//! use recital_playback::segment;
//!
//! let sentences = segment("One\n\nTwo");
//! assert_eq!(sentences.len(), 2);
//! assert_eq!(sentences[0].as_str(), "One\n\n");
//! assert_eq!(sentences.concat(), "One\n\nTwo");
//! ```
//!
//! # Example: Driving a Controller
//!
//! The deterministic collaborators live in `testing`, behind the `test-utils`
//! feature.
//!
//! ```rust
//! use recital_core::{EngineEvent, EngineEventKind, ReaderState};
//! use recital_playback::testing::{ManualClock, ManualScheduler, RecordingEngine};
//! use recital_playback::{ControllerSettings, ReadingController};
//! use std::time::Duration;
//!
//! let engine = RecordingEngine::new();
//! let clock = ManualClock::new();
//! let scheduler = ManualScheduler::new(clock.clone());
//!
//! let mut reader = ReadingController::new(
//!     Box::new(engine.clone()),
//!     Box::new(scheduler.clone()),
//!     Box::new(clock.clone()),
//!     ControllerSettings::default(),
//! );
//!
//! reader.set_text("Hello world. How are you?");
//! reader.play();
//! assert_eq!(reader.state(), ReaderState::Speaking);
//!
//! // The engine finishes the first sentence
//! let id = reader.active_utterance().unwrap();
//! reader.handle_engine_event(EngineEvent::new(id, EngineEventKind::End));
//! assert_eq!(reader.cursor(), 1);
//!
//! // Settle delay elapses
//! clock.advance(Duration::from_millis(250));
//! for token in scheduler.take_due() {
//!     reader.handle_timer(token);
//! }
//! assert_eq!(engine.spoken_texts(), ["Hello world.", "How are you?"]);
//! ```

mod controller;
mod error;
mod events;
mod segmenter;
mod sequencer;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod timing;
pub mod types;
mod voices;

// Public exports
pub use controller::ReadingController;
pub use error::{PlaybackError, Result};
pub use events::ReaderEvent;
pub use segmenter::{segment, SentenceList};
pub use sequencer::{AcceptedEvent, UtteranceSequencer};
pub use timing::{format_eta, TimingEstimator};
pub use types::{ControllerSettings, PersistTrigger, ReaderStatus};
pub use voices::select_default_voice;
