use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Storage;
use crate::error::StorageResult;
use crate::tree::Forest;

/// In-memory storage backend. Clones share the same slot.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<RwLock<Option<Forest>>>,
}

impl MemoryStorage {
    /// Create an empty store (no forest saved yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `forest`.
    pub fn with_forest(forest: Forest) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(forest))),
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn load_forest(&self) -> StorageResult<Option<Forest>> {
        Ok(self.slot.read().await.clone())
    }

    async fn save_forest(&self, forest: &Forest) -> StorageResult<()> {
        *self.slot.write().await = Some(forest.clone());
        Ok(())
    }
}
