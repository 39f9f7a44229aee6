//! Storage layer for the session forest.
//!
//! The forest is persisted as a single entry: every mutation loads the whole
//! forest, changes it in memory and writes it back. Backends:
//! - [`SqliteStorage`]: one row keyed [`SESSION_KEY`] holding the forest JSON
//! - [`MemoryStorage`]: process-local, used by tests and `STORAGE_BACKEND=memory`

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::tree::Forest;

/// Storage key the forest lives under.
pub const SESSION_KEY: &str = "sessionData";

/// Persistence for the session forest.
///
/// Callers are responsible for serializing read-modify-write cycles; a
/// backend only guarantees that each `save_forest` replaces the stored
/// forest wholesale.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Load the stored forest, `None` if nothing has been stored yet.
    async fn load_forest(&self) -> StorageResult<Option<Forest>>;

    /// Replace the stored forest.
    async fn save_forest(&self, forest: &Forest) -> StorageResult<()>;

    /// Load the stored forest, treating absence as the empty forest.
    async fn load_forest_or_empty(&self) -> StorageResult<Forest> {
        Ok(self.load_forest().await?.unwrap_or_default())
    }
}
