//! Data cache configuration.

use crate::domain::error::ConfigError;
use serde::{Deserialize, Serialize};
use shared_bus::humantime_serde;
use std::time::Duration;

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    /// Namespaced key-value backend; falls back to memory when unavailable.
    Persistent,
}

/// Main cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataCacheConfig {
    /// Entries younger than this are fresh
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,
    /// Extra time past `max_age` during which an entry may be served stale
    #[serde(with = "humantime_serde")]
    pub stale_age: Duration,
    /// Serve stale entries while refreshing them in the background
    pub stale_while_revalidate: bool,
    pub storage: StorageKind,
    /// Prefix for persistent keys: `"{namespace}:{key}"`
    pub namespace: String,
}

impl Default for DataCacheConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(5 * 60),
            stale_age: Duration::from_secs(10 * 60),
            stale_while_revalidate: true,
            storage: StorageKind::Memory,
            namespace: "dataCache".to_string(),
        }
    }
}

impl DataCacheConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_age.is_zero() {
            return Err(ConfigError::InvalidAge("max_age cannot be 0".into()));
        }
        if self.namespace.is_empty() {
            return Err(ConfigError::InvalidNamespace("namespace cannot be empty".into()));
        }
        if self.namespace.contains(':') {
            return Err(ConfigError::InvalidNamespace(format!(
                "namespace '{}' cannot contain ':'",
                self.namespace
            )));
        }
        Ok(())
    }
}
