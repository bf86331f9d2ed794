//! # Event Publisher
//!
//! Defines the publishing side of the event bus and the in-process bus itself.

use crate::events::{EventName, OfficeEvent, Severity};
use crate::history::{EventHistory, EventRecord};
use crate::subscriber::{ListenerOptions, ListenerRegistry, ListenerResult, Subscription};
use crate::DEFAULT_HISTORY_CAPACITY;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Trait for emitting events onto the bus.
///
/// The call client and the data cache depend on this seam rather than on
/// [`EventBus`] directly.
pub trait EventPublisher: Send + Sync {
    /// Synchronously deliver `event` to every listener registered for it.
    fn emit(&self, event: OfficeEvent);
}

/// Errors from bus operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Replay range with `from > to`.
    #[error("invalid replay range: {from}..{to}")]
    InvalidRange { from: usize, to: usize },
}

/// Bus configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBusConfig {
    /// Number of emissions kept in the history ring buffer.
    pub history_capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Running statistics snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventBusStats {
    pub total_events_emitted: u64,
    pub total_listeners: usize,
    pub event_counts: HashMap<EventName, u64>,
    /// Mean time spent inside `emit`, in milliseconds.
    pub average_emit_time_ms: f64,
    /// Listener failures (returned errors and panics).
    pub errors: u64,
}

#[derive(Debug, Default)]
struct StatsState {
    total_events_emitted: u64,
    event_counts: HashMap<EventName, u64>,
    average_emit_time_ms: f64,
    errors: u64,
}

impl StatsState {
    fn record(&mut self, event: EventName, duration: Duration, errors: usize) {
        self.total_events_emitted += 1;
        self.errors += errors as u64;
        *self.event_counts.entry(event).or_insert(0) += 1;

        let n = self.total_events_emitted as f64;
        let ms = duration.as_secs_f64() * 1000.0;
        self.average_emit_time_ms = (self.average_emit_time_ms * (n - 1.0) + ms) / n;
    }
}

/// In-process publish/subscribe hub.
///
/// Listeners run synchronously inside [`EventBus::emit`], highest priority
/// first and in registration order within a priority. No lock is held while
/// a listener runs, so listeners may emit, subscribe or unsubscribe.
pub struct EventBus {
    registry: Arc<Mutex<ListenerRegistry>>,
    history: Mutex<EventHistory>,
    stats: Mutex<StatsState>,
}

impl EventBus {
    /// Create a bus with the default history capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    #[must_use]
    pub fn with_config(config: EventBusConfig) -> Self {
        Self {
            registry: Arc::new(Mutex::new(ListenerRegistry::default())),
            history: Mutex::new(EventHistory::with_capacity(config.history_capacity)),
            stats: Mutex::new(StatsState::default()),
        }
    }

    /// Register `callback` for `event`.
    pub fn on<F>(&self, event: EventName, callback: F, options: ListenerOptions) -> Subscription
    where
        F: Fn(&OfficeEvent) -> ListenerResult + Send + Sync + 'static,
    {
        let id = self
            .registry
            .lock()
            .register(event, Arc::new(callback), options);
        debug!(
            event = %event,
            id = %id,
            priority = options.priority,
            once = options.once,
            "Subscribed"
        );
        Subscription::new(&self.registry, event, id)
    }

    /// Register a listener that fires at most once.
    pub fn once<F>(&self, event: EventName, callback: F, priority: i32) -> Subscription
    where
        F: Fn(&OfficeEvent) -> ListenerResult + Send + Sync + 'static,
    {
        self.on(event, callback, ListenerOptions::priority(priority).with_once(true))
    }

    /// Remove every listener for `event`. Returns how many were removed.
    pub fn off(&self, event: EventName) -> usize {
        let removed = self.registry.lock().remove_event(event);
        debug!(event = %event, removed, "Removed all listeners");
        removed
    }

    /// Remove every listener for every event.
    pub fn clear(&self) -> usize {
        let removed = self.registry.lock().clear();
        debug!(removed, "Cleared all listeners");
        removed
    }

    /// Deliver `event` to its listeners.
    ///
    /// A listener that returns `Err` or panics is isolated: the remaining
    /// listeners still run and the failure is re-published as `system:error`.
    /// Failures inside `system:error` listeners are logged and dropped.
    pub fn emit(&self, event: OfficeEvent) {
        let start = Instant::now();
        let name = event.name();
        let listeners = self.registry.lock().take_for_emit(name);

        if listeners.is_empty() {
            debug!(event = %name, "No listeners");
        }

        let mut notified = 0usize;
        let mut errors = 0usize;

        for listener in &listeners {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (listener.callback)(&event)));
            let failure = match outcome {
                Ok(Ok(())) => {
                    notified += 1;
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(payload) => panic_message(payload.as_ref()),
            };

            errors += 1;
            error!(event = %name, id = %listener.id, error = %failure, "Listener failed");

            if name == EventName::SystemError {
                warn!(id = %listener.id, "Dropping failure raised by a system:error listener");
            } else {
                self.emit(OfficeEvent::system_error(
                    failure,
                    format!("Event listener for {name}"),
                    Severity::Medium,
                ));
            }
        }

        let duration = start.elapsed();
        self.stats.lock().record(name, duration, errors);
        self.history.lock().push(EventRecord {
            event,
            timestamp: Utc::now(),
            duration,
            listeners_notified: notified,
            errors,
        });

        debug!(
            event = %name,
            listeners = notified,
            errors,
            duration_us = duration.as_micros() as u64,
            "Event emitted"
        );
    }

    /// Full history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<EventRecord> {
        self.history.lock().snapshot()
    }

    /// The most recent `count` records, oldest first.
    #[must_use]
    pub fn last_events(&self, count: usize) -> Vec<EventRecord> {
        self.history.lock().last(count)
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    /// Re-emit recorded events in `[from, to)` in their original order.
    ///
    /// `to = None` means up to the end. Returns the number of events replayed.
    /// Replayed events are appended to the history like any other emission.
    pub fn replay(&self, from: usize, to: Option<usize>) -> Result<usize, BusError> {
        let to = to.unwrap_or(usize::MAX);
        if from > to {
            return Err(BusError::InvalidRange { from, to });
        }
        let events = self.history.lock().range(from, to);
        info!(count = events.len(), "Replaying events");
        let count = events.len();
        for event in events {
            self.emit(event);
        }
        Ok(count)
    }

    #[must_use]
    pub fn stats(&self) -> EventBusStats {
        let total_listeners = self.registry.lock().total();
        let stats = self.stats.lock();
        EventBusStats {
            total_events_emitted: stats.total_events_emitted,
            total_listeners,
            event_counts: stats.event_counts.clone(),
            average_emit_time_ms: stats.average_emit_time_ms,
            errors: stats.errors,
        }
    }

    /// Reset counters. Registered listeners are untouched.
    pub fn reset_stats(&self) {
        *self.stats.lock() = StatsState::default();
    }

    /// Listener count per event that has at least one listener.
    #[must_use]
    pub fn event_summary(&self) -> HashMap<EventName, usize> {
        self.registry.lock().summary()
    }

    #[must_use]
    pub fn listener_count(&self, event: EventName) -> usize {
        self.registry.lock().count(event)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for EventBus {
    fn emit(&self, event: OfficeEvent) {
        EventBus::emit(self, event);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "listener panicked".to_string()
    }
}
