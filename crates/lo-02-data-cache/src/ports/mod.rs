//! Ports layer: clock, raw key-value backend, and entry storage.

pub mod outbound;

pub use outbound::{CacheStore, KeyValueStore, MockTimeSource, SystemTimeSource, TimeSource};
