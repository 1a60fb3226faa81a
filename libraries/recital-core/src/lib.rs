//! Recital Core
//!
//! Platform-agnostic types, traits, and error handling for the Recital
//! sentence reader.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Sentence`, `VoiceParams`, `PositionSnapshot`, `ReaderState`
//! - **Collaborator Traits**: `SpeechEngine`, `Scheduler`, `Clock`, `PositionStore`
//! - **Error Handling**: Unified `RecitalError` and `Result` types
//!
//! Nothing in here talks to a real synthesis engine, database, or timer. Those
//! are injected by the crates that compose a reader.
//!
//! # Example
//!
//! ```rust
//! use recital_core::types::{DocumentId, PositionSnapshot, VoiceParams};
//!
//! let doc = DocumentId::for_text("Hello world. How are you?");
//! let snapshot = PositionSnapshot::new(doc.clone(), 1, 0);
//! assert_eq!(snapshot.clamped_index(2), Some(1));
//!
//! let params = VoiceParams::default().with_rate(5.0);
//! assert_eq!(params.rate, 2.0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod storage;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{RecitalError, Result};
pub use storage::PositionStore;
pub use traits::{Clock, EngineEvent, EngineEventKind, Scheduler, SpeechEngine, SystemClock};

pub use types::{
    DocumentId, PositionSnapshot, ReaderState, Sentence, TimerToken, Utterance, UtteranceId,
    VoiceInfo, VoiceParams, VoiceParamsUpdate,
};
