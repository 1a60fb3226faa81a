//! Recital Storage
//!
//! `SQLite` persistence for reading positions.
//!
//! # Architecture
//!
//! - **One row per document**: saving replaces the previous snapshot
//! - **Vertical slice**: [`positions`] owns its queries
//! - **Trait adapters**: [`SqlitePositionStore`] and [`MemoryPositionStore`]
//!   implement `recital_core::PositionStore`
//!
//! # Example
//!
//! ```rust,no_run
//! use recital_core::{DocumentId, PositionSnapshot, PositionStore};
//! use recital_storage::SqlitePositionStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqlitePositionStore::open("sqlite://recital.db").await?;
//!
//! let doc = DocumentId::new("meditation-01");
//! store.save(&PositionSnapshot::new(doc.clone(), 12, 0)).await?;
//!
//! let snapshot = store.load(&doc).await?;
//! assert_eq!(snapshot.map(|s| s.sentence_index), Some(12));
//! # Ok(())
//! # }
//! ```

mod error;
mod memory;
mod sqlite;

// Vertical slices
pub mod positions;

pub use error::{Result, StorageError};
pub use memory::MemoryPositionStore;
pub use sqlite::SqlitePositionStore;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Safe to call on every start; applied migrations are skipped.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `sqlite://recital.db`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!("Creating pool with URL: {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}
