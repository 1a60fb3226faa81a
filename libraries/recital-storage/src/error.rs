//! Storage-specific errors
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// A stored row could not be turned back into a snapshot
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// Create an invalid data error
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }
}

impl From<sqlx::migrate::MigrateError> for StorageError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Migration(err.to_string())
    }
}

impl From<StorageError> for recital_core::RecitalError {
    fn from(err: StorageError) -> Self {
        recital_core::RecitalError::store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recital_core::RecitalError;

    #[test]
    fn converts_to_store_error() {
        let err: RecitalError = StorageError::invalid_data("negative index").into();
        assert!(matches!(err, RecitalError::Store(msg) if msg.contains("negative index")));
    }
}
