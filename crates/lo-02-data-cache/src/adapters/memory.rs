//! In-memory entry store.

use crate::domain::config::StorageKind;
use crate::domain::entry::CacheEntry;
use crate::domain::error::StorageError;
use crate::ports::outbound::CacheStore;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Entries held in a process-local map. Never fails.
#[derive(Debug)]
pub struct MemoryStore<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync> CacheStore<T> for MemoryStore<T> {
    fn get(&self, key: &str) -> Result<Option<CacheEntry<T>>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, entry: CacheEntry<T>) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), entry);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.entries.lock().remove(key).is_some())
    }

    fn clear(&self) -> Result<usize, StorageError> {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        Ok(count)
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.entries.lock().len())
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Memory
    }
}
