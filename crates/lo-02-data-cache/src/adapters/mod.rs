//! Storage adapters.
//!
//! - [`MemoryStore`]: typed entries in a process-local map
//! - [`PersistentStore`]: JSON records in a namespaced [`KeyValueStore`]
//! - [`InMemoryKeyValueStore`]: `localStorage`-like string map
//! - `RocksKeyValueStore`: on-disk backend (enable the `rocksdb` feature)
//!
//! [`KeyValueStore`]: crate::ports::KeyValueStore

pub mod kv_memory;
pub mod memory;
pub mod persistent;

#[cfg(feature = "rocksdb")]
pub mod rocks;

pub use kv_memory::InMemoryKeyValueStore;
pub use memory::MemoryStore;
pub use persistent::PersistentStore;

#[cfg(feature = "rocksdb")]
pub use rocks::{RocksKeyValueStore, RocksStoreConfig};
