//! Short-lived response cache keyed by call signature.

use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CachedResponse {
    data: Value,
    expires_at: Instant,
}

/// Successful responses stored for a caller-chosen TTL.
///
/// Expired entries are dropped on lookup and swept on every insert.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<String, CachedResponse>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a live entry, removing it if it has expired.
    pub fn get(&mut self, signature: &str) -> Option<Value> {
        let now = Instant::now();
        match self.entries.get(signature) {
            Some(entry) if now < entry.expires_at => Some(entry.data.clone()),
            Some(_) => {
                self.entries.remove(signature);
                None
            }
            None => None,
        }
    }

    pub fn insert(&mut self, signature: String, data: Value, ttl: Duration) {
        let now = Instant::now();
        self.entries.retain(|_, entry| now < entry.expires_at);
        self.entries.insert(
            signature,
            CachedResponse {
                data,
                expires_at: now + ttl,
            },
        );
    }

    pub fn remove(&mut self, signature: &str) -> bool {
        self.entries.remove(signature).is_some()
    }

    /// Drop everything, returning how many entries were held.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
