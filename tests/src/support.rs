//! Shared fixtures for the integration scenarios.

use async_trait::async_trait;
use lo_01_call_client::{OperationInvoker, RemoteError};
use parking_lot::Mutex;
use serde_json::Value;
use shared_bus::{EventBus, EventName, ListenerOptions, OfficeEvent, Subscription};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Invoker answering from a script, then from a fallback.
pub struct ScriptedInvoker {
    script: Mutex<VecDeque<Result<Value, RemoteError>>>,
    fallback: Result<Value, RemoteError>,
    delay: Duration,
    calls: AtomicU32,
    log: Mutex<Vec<String>>,
}

impl ScriptedInvoker {
    pub fn ok(value: Value) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Ok(value),
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: RemoteError) -> Self {
        Self {
            fallback: Err(error),
            ..Self::ok(Value::Null)
        }
    }

    pub fn with_script(self, responses: Vec<Result<Value, RemoteError>>) -> Self {
        *self.script.lock() = responses.into();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Operation names in the order their executions started.
    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

#[async_trait]
impl OperationInvoker for ScriptedInvoker {
    async fn invoke(&self, operation: &str, _payload: &Value) -> Result<Value, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().push(operation.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// Collects every payload emitted for one event name.
pub struct Recorder {
    events: Arc<Mutex<Vec<OfficeEvent>>>,
    _subscription: Subscription,
}

impl Recorder {
    pub fn attach(bus: &EventBus, name: EventName) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let subscription = bus.on(
            name,
            move |event| {
                sink.lock().push(event.clone());
                Ok(())
            },
            ListenerOptions::default(),
        );
        Self {
            events,
            _subscription: subscription,
        }
    }

    pub fn events(&self) -> Vec<OfficeEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}
