//! # Data Cache - Stale-While-Revalidate
//!
//! Wraps any asynchronous fetch function with a keyed cache that trades
//! freshness for latency in three age bands:
//!
//! | Age | Behaviour |
//! |-----|-----------|
//! | `< max_age` | fresh hit, no fetch |
//! | `< max_age + stale_age` | stale hit, one background refresh per key |
//! | otherwise | miss, caller waits for the fetch |
//!
//! Storage is pluggable: a process-local map, or a namespaced key-value
//! backend (`"{namespace}:{key}"` → `{data, timestamp, expiresAt}`). A
//! backend that fails its write check at construction is replaced by memory.
//!
//! ```rust,ignore
//! let cache: SwrCache<Vec<Client>> = SwrCache::new(DataCacheConfig::default())?;
//! let clients = cache
//!     .get("clients", || async { load_clients().await }, GetOptions::default())
//!     .await?;
//! ```

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{InMemoryKeyValueStore, MemoryStore, PersistentStore};
#[cfg(feature = "rocksdb")]
pub use adapters::{RocksKeyValueStore, RocksStoreConfig};
pub use domain::{
    CacheEntry, CacheError, CacheStats, ConfigError, DataCacheConfig, Freshness, StorageError,
    StorageKind,
};
pub use ports::{CacheStore, KeyValueStore, MockTimeSource, SystemTimeSource, TimeSource};
pub use service::{CacheErrorHook, GetOptions, SwrCache, SwrCacheBuilder};
