//! SQLite-backed position store
use async_trait::async_trait;
use recital_core::storage::PositionStore;
use recital_core::types::{DocumentId, PositionSnapshot};
use sqlx::SqlitePool;

use crate::error::Result;
use crate::{create_pool, positions, run_migrations};

/// Position store over a `SQLite` pool
#[derive(Debug, Clone)]
pub struct SqlitePositionStore {
    pool: SqlitePool,
}

impl SqlitePositionStore {
    /// Wrap an existing pool (migrations must already be applied)
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect and migrate
    ///
    /// # Errors
    /// Returns an error if the connection or a migration fails
    pub async fn open(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Every saved position, most recently updated first
    ///
    /// # Errors
    /// Returns an error if the query fails
    pub async fn list(&self) -> Result<Vec<PositionSnapshot>> {
        positions::list(&self.pool).await
    }
}

#[async_trait]
impl PositionStore for SqlitePositionStore {
    async fn load(&self, document: &DocumentId) -> recital_core::Result<Option<PositionSnapshot>> {
        Ok(positions::get(&self.pool, document).await?)
    }

    async fn save(&self, snapshot: &PositionSnapshot) -> recital_core::Result<()> {
        tracing::trace!(
            "Saving {} at sentence {}",
            snapshot.document_identity,
            snapshot.sentence_index
        );
        Ok(positions::upsert(&self.pool, snapshot).await?)
    }

    async fn clear(&self, document: &DocumentId) -> recital_core::Result<()> {
        positions::delete(&self.pool, document).await?;
        Ok(())
    }
}
