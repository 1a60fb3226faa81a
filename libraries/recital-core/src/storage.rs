//! Position store trait

use crate::error::Result;
use crate::types::{DocumentId, PositionSnapshot};
use async_trait::async_trait;

/// Durable store of reading positions, keyed by document
///
/// Both operations are independently retryable. The reading controller never
/// calls the store itself; it emits persistence requests that the composing
/// layer turns into `save` calls under its own policy.
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Load the last snapshot for a document
    async fn load(&self, document: &DocumentId) -> Result<Option<PositionSnapshot>>;

    /// Save (replace) the snapshot for its document
    async fn save(&self, snapshot: &PositionSnapshot) -> Result<()>;

    /// Forget the snapshot for a document
    async fn clear(&self, document: &DocumentId) -> Result<()>;
}
