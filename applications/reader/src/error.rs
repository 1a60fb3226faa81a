/// Reader error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReaderError>;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] recital_storage::StorageError),

    #[error("Session error: {0}")]
    Session(#[from] recital_session::SessionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
