//! Namespaced JSON records over a [`KeyValueStore`].

use crate::domain::config::StorageKind;
use crate::domain::entry::CacheEntry;
use crate::domain::error::StorageError;
use crate::ports::outbound::{CacheStore, KeyValueStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

const CHECK_KEY: &str = "__storage_check__";

/// Entries stored as `"{namespace}:{key}" -> {"data", "timestamp", "expiresAt"}`.
pub struct PersistentStore<T> {
    kv: Arc<dyn KeyValueStore>,
    prefix: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> PersistentStore<T> {
    pub fn new(kv: Arc<dyn KeyValueStore>, namespace: &str) -> Self {
        Self {
            kv,
            prefix: format!("{namespace}:"),
            _marker: PhantomData,
        }
    }

    /// Write and remove a throwaway key to check the backend is usable.
    pub fn check_writable(&self) -> Result<(), StorageError> {
        self.kv.set_item(CHECK_KEY, CHECK_KEY)?;
        self.kv.remove_item(CHECK_KEY)
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    fn namespaced_keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .kv
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(&self.prefix))
            .collect())
    }
}

impl<T> CacheStore<T> for PersistentStore<T>
where
    T: Serialize + DeserializeOwned,
{
    fn get(&self, key: &str) -> Result<Option<CacheEntry<T>>, StorageError> {
        let storage_key = self.storage_key(key);
        match self.kv.get_item(&storage_key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StorageError::Corrupt {
                    key: storage_key,
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, entry: CacheEntry<T>) -> Result<(), StorageError> {
        let storage_key = self.storage_key(key);
        let raw = serde_json::to_string(&entry).map_err(|e| StorageError::Corrupt {
            key: storage_key.clone(),
            reason: e.to_string(),
        })?;
        self.kv.set_item(&storage_key, &raw)
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let storage_key = self.storage_key(key);
        let existed = self.kv.get_item(&storage_key)?.is_some();
        self.kv.remove_item(&storage_key)?;
        Ok(existed)
    }

    fn clear(&self) -> Result<usize, StorageError> {
        let keys = self.namespaced_keys()?;
        for key in &keys {
            self.kv.remove_item(key)?;
        }
        debug!(prefix = %self.prefix, removed = keys.len(), "Cleared namespace");
        Ok(keys.len())
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.namespaced_keys()?.len())
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Persistent
    }
}
