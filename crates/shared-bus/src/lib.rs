//! # Shared Bus - In-Process Event Bus
//!
//! Loosely-coupled notification hub used by the call client, the data cache
//! and every UI collaborator.
//!
//! ## Delivery Rules
//!
//! - `emit()` is synchronous: every listener for the event runs before it returns
//! - Listeners run highest `priority` first, registration order breaks ties
//! - A listener that fails (returns `Err` or panics) never reaches the emitter;
//!   it is counted and re-published as `system:error`
//! - Every emission is appended to a bounded history (oldest evicted first)
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Call Client  │                    │   UI code    │
//! │  Data Cache  │     emit()         │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  on() / once()
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod history;
pub mod humantime_serde;
pub mod publisher;
pub mod subscriber;

use std::sync::Arc;

// Re-export main types
pub use events::{
    CacheAction, EventFamily, EventName, NotificationKind, OfficeEvent, SelectorType, Severity,
    SystemErrorPayload, UnknownEventName,
};
pub use history::{EventHistory, EventRecord};
pub use publisher::{BusError, EventBus, EventBusConfig, EventBusStats, EventPublisher};
pub use subscriber::{ListenerError, ListenerId, ListenerOptions, ListenerResult, Subscription};

/// Default number of emissions kept in the history buffer.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

lazy_static::lazy_static! {
    static ref GLOBAL_BUS: Arc<EventBus> = Arc::new(EventBus::new());
}

/// Process-wide default bus.
///
/// Prefer constructing an [`EventBus`] and passing it explicitly; tests in
/// particular should never rely on this instance.
#[must_use]
pub fn global() -> Arc<EventBus> {
    Arc::clone(&GLOBAL_BUS)
}
