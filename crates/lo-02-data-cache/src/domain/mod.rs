//! Domain layer: entries, age bands, configuration and errors.

pub mod config;
pub mod entry;
pub mod error;
pub mod stats;

pub use config::{DataCacheConfig, StorageKind};
pub use entry::{CacheEntry, Freshness};
pub use error::{CacheError, ConfigError, StorageError};
pub use stats::CacheStats;
