//! In-memory index storage for tests and dry runs.

use std::sync::{Arc, RwLock};

use crate::error::IndexResult;
use crate::traits::store::IndexStore;
use crate::types::topic::TopicEntry;

/// Index storage that lives only as long as the process.
///
/// Clones share the same underlying entries, so a test can keep a handle
/// and inspect what the builder saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndexStore {
    entries: Arc<RwLock<Vec<TopicEntry>>>,
    saves: Arc<RwLock<usize>>,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with some entries already stored.
    pub fn with_entries(entries: Vec<TopicEntry>) -> Self {
        let store = Self::new();
        *store.entries.write().unwrap() = entries;
        store
    }

    pub fn snapshot(&self) -> Vec<TopicEntry> {
        self.entries.read().unwrap().clone()
    }

    /// Number of times `save` was called.
    pub fn save_count(&self) -> usize {
        *self.saves.read().unwrap()
    }
}

impl IndexStore for MemoryIndexStore {
    fn load(&self) -> Vec<TopicEntry> {
        self.snapshot()
    }

    fn save(&self, entries: &[TopicEntry]) -> IndexResult<()> {
        *self.entries.write().unwrap() = entries.to_vec();
        *self.saves.write().unwrap() += 1;
        Ok(())
    }

    fn clear(&self) -> IndexResult<()> {
        self.entries.write().unwrap().clear();
        Ok(())
    }
}
