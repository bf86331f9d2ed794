//! # Event History
//!
//! Bounded ring buffer of emitted events, kept for debugging and replay.

use crate::events::OfficeEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;

/// One emission, as recorded after all listeners ran.
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub event: OfficeEvent,
    pub timestamp: DateTime<Utc>,
    /// Time spent invoking listeners.
    pub duration: Duration,
    pub listeners_notified: usize,
    pub errors: usize,
}

/// Fixed-capacity history; the oldest record is evicted first.
#[derive(Debug)]
pub struct EventHistory {
    entries: VecDeque<EventRecord>,
    capacity: usize,
}

impl EventHistory {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn push(&mut self, record: EventRecord) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EventRecord> {
        self.entries.iter().cloned().collect()
    }

    /// The most recent `count` records, oldest first.
    #[must_use]
    pub fn last(&self, count: usize) -> Vec<EventRecord> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Events in `[from, to)`, both clamped to the current length.
    #[must_use]
    pub fn range(&self, from: usize, to: usize) -> Vec<OfficeEvent> {
        let to = to.min(self.entries.len());
        if from >= to {
            return Vec::new();
        }
        self.entries
            .range(from..to)
            .map(|record| record.event.clone())
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
