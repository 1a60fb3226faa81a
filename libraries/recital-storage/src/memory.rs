//! In-memory position store
use async_trait::async_trait;
use recital_core::error::RecitalError;
use recital_core::storage::PositionStore;
use recital_core::types::{DocumentId, PositionSnapshot};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Position store that lives only as long as the process
///
/// Clones share the same map. Failures can be switched on to exercise the
/// caller's warning and retry paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryPositionStore {
    snapshots: Arc<RwLock<HashMap<DocumentId, PositionSnapshot>>>,
    failing: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
}

impl MemoryPositionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail until switched off again
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Saved position for a document, bypassing failure injection
    pub async fn get(&self, document: &DocumentId) -> Option<PositionSnapshot> {
        self.snapshots.read().await.get(document).cloned()
    }

    fn check(&self) -> recital_core::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(RecitalError::store("store unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PositionStore for MemoryPositionStore {
    async fn load(&self, document: &DocumentId) -> recital_core::Result<Option<PositionSnapshot>> {
        self.check()?;
        Ok(self.snapshots.read().await.get(document).cloned())
    }

    async fn save(&self, snapshot: &PositionSnapshot) -> recital_core::Result<()> {
        self.check()?;
        self.snapshots
            .write()
            .await
            .insert(snapshot.document_identity.clone(), snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self, document: &DocumentId) -> recital_core::Result<()> {
        self.check()?;
        self.snapshots.write().await.remove(document);
        Ok(())
    }
}
