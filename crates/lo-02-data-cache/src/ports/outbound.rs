//! Outbound ports (driven side).

use crate::domain::config::StorageKind;
use crate::domain::entry::CacheEntry;
use crate::domain::error::StorageError;
use std::sync::atomic::{AtomicU64, Ordering};

/// Wall-clock source in milliseconds.
pub trait TimeSource: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// System time via `chrono`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug, Default)]
pub struct MockTimeSource {
    now: AtomicU64,
}

impl MockTimeSource {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl TimeSource for MockTimeSource {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// String-to-string backend in the shape of browser `localStorage`.
///
/// Implementations own their synchronisation; every method takes `&self`.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Every key currently held, across all namespaces.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Typed entry storage used by the cache.
pub trait CacheStore<T>: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<CacheEntry<T>>, StorageError>;

    fn set(&self, key: &str, entry: CacheEntry<T>) -> Result<(), StorageError>;

    /// Returns whether an entry was present.
    fn remove(&self, key: &str) -> Result<bool, StorageError>;

    /// Returns how many entries were removed.
    fn clear(&self) -> Result<usize, StorageError>;

    fn len(&self) -> Result<usize, StorageError>;

    fn kind(&self) -> StorageKind;
}
