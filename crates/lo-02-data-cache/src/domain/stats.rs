//! Hit/miss accounting.

use serde::Serialize;

/// Snapshot returned by [`crate::SwrCache::stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Fresh and stale hits.
    pub hits: u64,
    /// Misses and expired entries.
    pub misses: u64,
    /// Background revalidations started.
    pub revalidations: u64,
    pub errors: u64,
    /// Entries currently stored.
    pub size: usize,
    /// Rounded percentage of lookups that were hits (0-100).
    pub hit_rate: u32,
}

#[derive(Debug, Default)]
pub(crate) struct StatsState {
    pub hits: u64,
    pub misses: u64,
    pub revalidations: u64,
    pub errors: u64,
}

impl StatsState {
    pub fn snapshot(&self, size: usize) -> CacheStats {
        let total = self.hits + self.misses;
        let hit_rate = if total == 0 {
            0
        } else {
            ((self.hits as f64 / total as f64) * 100.0).round() as u32
        };
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            revalidations: self.revalidations,
            errors: self.errors,
            size,
            hit_rate,
        }
    }
}
