//! Recital Reader Library
//!
//! Configuration, key handling and output formatting for the `recital`
//! terminal reader. Exposed as a library for testing.

pub mod config;
pub mod error;
pub mod keys;
pub mod render;

pub use config::AppConfig;
pub use error::{ReaderError, Result};
pub use keys::KeyCommand;
