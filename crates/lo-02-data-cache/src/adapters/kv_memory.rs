//! `localStorage`-like string map.

use crate::domain::error::StorageError;
use crate::ports::outbound::KeyValueStore;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Process-local [`KeyValueStore`] with an optional entry quota.
///
/// Can be switched off to exercise callers' fallback paths.
#[derive(Debug)]
pub struct InMemoryKeyValueStore {
    items: Mutex<BTreeMap<String, String>>,
    quota: Option<usize>,
    available: AtomicBool,
    writable: AtomicBool,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            quota: None,
            available: AtomicBool::new(true),
            writable: AtomicBool::new(true),
        }
    }

    /// Refuse writes of new keys once `quota` keys are held.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::new()
        }
    }

    /// Toggle availability; every operation fails while unavailable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// While not writable, `set_item` fails as if storage were full; reads
    /// and removals still work.
    pub fn set_writable(&self, writable: bool) {
        self.writable.store(writable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("key-value store disabled".into()))
        }
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;
        if !self.writable.load(Ordering::SeqCst) {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
            });
        }
        let mut items = self.items.lock();
        if let Some(quota) = self.quota {
            if !items.contains_key(key) && items.len() >= quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        self.items.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.check_available()?;
        Ok(self.items.lock().keys().cloned().collect())
    }
}
