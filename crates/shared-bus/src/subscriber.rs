//! # Event Subscriber
//!
//! Defines the subscription side of the event bus: listener records and the
//! handle returned at registration.

use crate::events::{EventName, OfficeEvent};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Error a listener may return. It is caught by the bus, never by the emitter.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Result every listener callback returns.
pub type ListenerResult = Result<(), ListenerError>;

/// Listener callback.
pub type ListenerFn = dyn Fn(&OfficeEvent) -> ListenerResult + Send + Sync;

/// Unique listener identifier. Monotonic, so it doubles as registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Registration options for [`crate::EventBus::on`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Higher priority runs first.
    pub priority: i32,
    /// Remove the listener after it fires once.
    pub once: bool,
}

impl ListenerOptions {
    #[must_use]
    pub fn priority(priority: i32) -> Self {
        Self {
            priority,
            once: false,
        }
    }

    #[must_use]
    pub fn once() -> Self {
        Self {
            priority: 0,
            once: true,
        }
    }

    #[must_use]
    pub fn with_once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }
}

/// A registered listener.
#[derive(Clone)]
pub(crate) struct Listener {
    pub(crate) id: ListenerId,
    pub(crate) priority: i32,
    pub(crate) once: bool,
    pub(crate) callback: Arc<ListenerFn>,
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("once", &self.once)
            .finish_non_exhaustive()
    }
}

/// Listener table keyed by event name.
#[derive(Debug, Default)]
pub(crate) struct ListenerRegistry {
    listeners: HashMap<EventName, Vec<Listener>>,
    next_id: u64,
}

impl ListenerRegistry {
    pub(crate) fn register(
        &mut self,
        event: EventName,
        callback: Arc<ListenerFn>,
        options: ListenerOptions,
    ) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.entry(event).or_default().push(Listener {
            id,
            priority: options.priority,
            once: options.once,
            callback,
        });
        id
    }

    pub(crate) fn remove(&mut self, event: EventName, id: ListenerId) -> bool {
        let Some(list) = self.listeners.get_mut(&event) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| l.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.listeners.remove(&event);
        }
        removed
    }

    /// Listeners for `event` in invocation order: priority descending, then
    /// registration order. One-shot listeners are dropped from the table as
    /// part of the same step.
    pub(crate) fn take_for_emit(&mut self, event: EventName) -> Vec<Listener> {
        let Some(list) = self.listeners.get_mut(&event) else {
            return Vec::new();
        };
        let mut ordered = list.clone();
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));

        list.retain(|l| !l.once);
        if list.is_empty() {
            self.listeners.remove(&event);
        }
        ordered
    }

    pub(crate) fn remove_event(&mut self, event: EventName) -> usize {
        self.listeners.remove(&event).map_or(0, |l| l.len())
    }

    pub(crate) fn clear(&mut self) -> usize {
        let total = self.total();
        self.listeners.clear();
        total
    }

    pub(crate) fn count(&self, event: EventName) -> usize {
        self.listeners.get(&event).map_or(0, Vec::len)
    }

    pub(crate) fn total(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    pub(crate) fn summary(&self) -> HashMap<EventName, usize> {
        self.listeners
            .iter()
            .map(|(name, list)| (*name, list.len()))
            .collect()
    }
}

/// Handle returned by [`crate::EventBus::on`].
///
/// Dropping the handle does NOT unsubscribe; call [`Subscription::unsubscribe`].
#[derive(Debug, Clone)]
pub struct Subscription {
    registry: Weak<Mutex<ListenerRegistry>>,
    event: EventName,
    id: ListenerId,
}

impl Subscription {
    pub(crate) fn new(
        registry: &Arc<Mutex<ListenerRegistry>>,
        event: EventName,
        id: ListenerId,
    ) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            event,
            id,
        }
    }

    /// Remove the listener.
    ///
    /// Returns `false` if it was already gone (fired as `once`, removed by
    /// `off`/`clear`, or the bus was dropped).
    pub fn unsubscribe(self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let removed = registry.lock().remove(self.event, self.id);
        debug!(event = %self.event, id = %self.id, removed, "Unsubscribed");
        removed
    }

    #[must_use]
    pub fn event(&self) -> EventName {
        self.event
    }

    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Arc<ListenerFn> {
        Arc::new(|_| Ok(()))
    }

    #[test]
    fn test_emit_order_priority_then_registration() {
        let mut registry = ListenerRegistry::default();
        let low = registry.register(EventName::TabChanged, noop(), ListenerOptions::priority(-1));
        let first = registry.register(EventName::TabChanged, noop(), ListenerOptions::default());
        let high = registry.register(EventName::TabChanged, noop(), ListenerOptions::priority(5));
        let second = registry.register(EventName::TabChanged, noop(), ListenerOptions::default());

        let order: Vec<_> = registry
            .take_for_emit(EventName::TabChanged)
            .iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(order, vec![high, first, second, low]);
    }

    #[test]
    fn test_once_listeners_removed_on_take() {
        let mut registry = ListenerRegistry::default();
        registry.register(EventName::TabChanged, noop(), ListenerOptions::once());
        registry.register(EventName::TabChanged, noop(), ListenerOptions::default());

        assert_eq!(registry.take_for_emit(EventName::TabChanged).len(), 2);
        assert_eq!(registry.count(EventName::TabChanged), 1);
    }

    #[test]
    fn test_remove_unknown_listener() {
        let mut registry = ListenerRegistry::default();
        assert!(!registry.remove(EventName::TabChanged, ListenerId(42)));
    }

    #[test]
    fn test_unsubscribe_after_registry_dropped() {
        let registry = Arc::new(Mutex::new(ListenerRegistry::default()));
        let id = registry
            .lock()
            .register(EventName::DataLoaded, noop(), ListenerOptions::default());
        let sub = Subscription::new(&registry, EventName::DataLoaded, id);
        drop(registry);
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn test_listener_id_display() {
        assert_eq!(ListenerId(7).to_string(), "listener-7");
    }
}
