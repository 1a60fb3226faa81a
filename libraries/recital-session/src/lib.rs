//! Recital Session
//!
//! Tokio runtime around a [`recital_playback::ReadingController`]: a single
//! task owns the controller and feeds it commands, engine events and timer
//! firings, publishes its events on a broadcast channel and turns persistence
//! requests into debounced saves against a [`recital_core::PositionStore`].
//!
//! # Example
//!
//! ```rust,no_run
//! use recital_core::types::DocumentId;
//! use recital_playback::ControllerSettings;
//! use recital_session::{PacedEngine, ReaderSession, SessionConfig};
//! use recital_storage::MemoryPositionStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> recital_session::Result<()> {
//! let (engine, engine_events) = PacedEngine::new(15.0);
//! let (session, _task) = ReaderSession::start(
//!     Box::new(engine),
//!     engine_events,
//!     Arc::new(MemoryPositionStore::new()),
//!     ControllerSettings::default(),
//!     SessionConfig::default(),
//! );
//!
//! session.open(DocumentId::new("notes"), "Hello world. How are you?")?;
//! session.play()?;
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod autosave;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod session;

pub use autosave::AutosavePolicy;
pub use engine::PacedEngine;
pub use error::{Result, SessionError};
pub use scheduler::{TokioClock, TokioScheduler};
pub use session::{ReaderSession, SessionCommand, SessionConfig, SessionHandle};
