//! # RocksDB Key-Value Adapter
//!
//! On-disk [`KeyValueStore`] so cached reads survive restarts. Keys and
//! values are stored as UTF-8; namespacing is left to [`PersistentStore`].
//!
//! [`PersistentStore`]: crate::adapters::PersistentStore

use crate::domain::error::StorageError;
use crate::ports::outbound::KeyValueStore;
use rocksdb::{IteratorMode, Options, WriteOptions, DB};
use std::path::Path;

/// RocksDB configuration
#[derive(Debug, Clone)]
pub struct RocksStoreConfig {
    /// Path to the database directory
    pub path: String,
    /// Write buffer size in bytes (default: 8MB)
    pub write_buffer_size: usize,
    /// Enable fsync after each write (default: false; cache data is rebuildable)
    pub sync_writes: bool,
}

impl Default for RocksStoreConfig {
    fn default() -> Self {
        Self {
            path: "./data/cache".to_string(),
            write_buffer_size: 8 * 1024 * 1024, // 8MB
            sync_writes: false,
        }
    }
}

/// RocksDB-backed key-value store
pub struct RocksKeyValueStore {
    db: DB,
    config: RocksStoreConfig,
}

impl RocksKeyValueStore {
    /// Open or create a database
    pub fn open(config: RocksStoreConfig) -> Result<Self, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let db = DB::open(&opts, &config.path)
            .map_err(|e| StorageError::Unavailable(format!("Failed to open RocksDB: {e}")))?;

        Ok(Self { db, config })
    }

    pub fn open_default(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::open(RocksStoreConfig {
            path: path.as_ref().to_string_lossy().to_string(),
            ..Default::default()
        })
    }

    fn write_opts(&self) -> WriteOptions {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        write_opts
    }
}

fn decode(key: &str, bytes: &[u8]) -> Result<String, StorageError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| StorageError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

impl KeyValueStore for RocksKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.db
            .get(key.as_bytes())
            .map_err(|e| StorageError::Io(format!("RocksDB get failed: {e}")))?
            .map(|bytes| decode(key, &bytes))
            .transpose()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.db
            .put_opt(key.as_bytes(), value.as_bytes(), &self.write_opts())
            .map_err(|e| StorageError::Io(format!("RocksDB put failed: {e}")))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.db
            .delete_opt(key.as_bytes(), &self.write_opts())
            .map_err(|e| StorageError::Io(format!("RocksDB delete failed: {e}")))
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        for item in self.db.iterator(IteratorMode::Start) {
            let (key, _) = item.map_err(|e| StorageError::Io(format!("RocksDB scan failed: {e}")))?;
            keys.push(decode("<scan>", &key)?);
        }
        Ok(keys)
    }
}
