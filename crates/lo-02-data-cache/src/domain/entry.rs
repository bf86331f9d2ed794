//! Cache entries and their age bands.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One stored value. Serialised as `{data, timestamp, expiresAt}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub data: T,
    /// Wall-clock milliseconds when the value was stored.
    pub timestamp: u64,
    /// `timestamp + max_age` at the time of storing.
    pub expires_at: u64,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, now_ms: u64, max_age: Duration) -> Self {
        Self {
            data,
            timestamp: now_ms,
            expires_at: now_ms.saturating_add(duration_ms(max_age)),
        }
    }

    /// Milliseconds since the entry was stored.
    #[must_use]
    pub fn age(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }
}

/// Where an entry's age falls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// `age < max_age`
    Fresh,
    /// `max_age <= age < max_age + stale_age`
    Stale,
    /// `age >= max_age + stale_age`
    Expired,
}

impl Freshness {
    #[must_use]
    pub fn classify(age_ms: u64, max_age: Duration, stale_age: Duration) -> Self {
        let max = duration_ms(max_age);
        let stale_limit = max.saturating_add(duration_ms(stale_age));
        if age_ms < max {
            Self::Fresh
        } else if age_ms < stale_limit {
            Self::Stale
        } else {
            Self::Expired
        }
    }
}

pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
