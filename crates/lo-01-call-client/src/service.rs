//! Call Client Service
//!
//! Wraps an [`OperationInvoker`] with response caching, in-flight
//! deduplication, fixed-window admission control, a priority queue, a hard
//! per-attempt timeout and retry with exponential backoff.
//!
//! ```text
//! call(op, payload)
//!   │
//!   ├─ response cache hit? ───────────────► return (cached)
//!   ├─ identical call in flight/queued? ──► join it
//!   ├─ window exhausted? ─► queue ─► processor admits ─┐
//!   │                                                  ▼
//!   └──────────────────────────────────────► execute: attempt ─► retry ↺ ─► settle
//! ```

use crate::domain::config::CallClientConfig;
use crate::domain::error::{ConfigError, ErrorCode, RemoteError};
use crate::domain::queue::{QueuedRequest, RequestQueue};
use crate::domain::rate_limit::FixedWindowLimiter;
use crate::domain::response::{CallOptions, CallPhase, CallResponse};
use crate::domain::response_cache::ResponseCache;
use crate::domain::signature::signature;
use crate::domain::stats::{CallClientStats, StatsState};
use crate::ports::outbound::OperationInvoker;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde_json::Value;
use shared_bus::{CacheAction, EventPublisher, OfficeEvent, Severity};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// Settlement of one execution, awaited by every deduplicated caller.
type SharedCall = Shared<BoxFuture<'static, CallResponse>>;

struct Inner {
    config: CallClientConfig,
    invoker: Arc<dyn OperationInvoker>,
    publisher: Arc<dyn EventPublisher>,
    limiter: FixedWindowLimiter,
    responses: Mutex<ResponseCache>,
    in_flight: DashMap<String, SharedCall>,
    queue: Mutex<RequestQueue>,
    /// Set while a queue processor task is running.
    processing: AtomicBool,
    stats: Mutex<StatsState>,
}

/// Fault-tolerant remote call client.
///
/// Cheap to clone; clones share every piece of state.
#[derive(Clone)]
pub struct CallClient {
    inner: Arc<Inner>,
}

impl CallClient {
    /// Create a client that reports lifecycle events to `publisher`.
    pub fn new(
        config: CallClientConfig,
        invoker: Arc<dyn OperationInvoker>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        info!(
            max_requests_per_window = config.rate_limit.max_requests_per_window,
            window_ms = config.rate_limit.window.as_millis() as u64,
            max_retries = config.retry.max_retries,
            "Creating call client"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                limiter: FixedWindowLimiter::new(&config.rate_limit),
                config,
                invoker,
                publisher,
                responses: Mutex::new(ResponseCache::new()),
                in_flight: DashMap::new(),
                queue: Mutex::new(RequestQueue::new()),
                processing: AtomicBool::new(false),
                stats: Mutex::new(StatsState::default()),
            }),
        })
    }

    /// Create a client reporting to the process-wide default bus.
    pub fn with_global_bus(
        config: CallClientConfig,
        invoker: Arc<dyn OperationInvoker>,
    ) -> Result<Self, ConfigError> {
        Self::new(config, invoker, shared_bus::global())
    }

    #[must_use]
    pub fn config(&self) -> &CallClientConfig {
        &self.inner.config
    }

    /// Run `operation` with `payload`.
    ///
    /// Never fails at the type level: business failures come back as
    /// [`crate::CallOutcome::Failure`].
    pub async fn call(&self, operation: &str, payload: Value, options: CallOptions) -> CallResponse {
        self.inner.stats.lock().total_calls += 1;
        debug!(operation = operation, "Call requested");
        self.dispatch(operation.to_string(), payload, options).await
    }

    async fn dispatch(&self, operation: String, payload: Value, options: CallOptions) -> CallResponse {
        let sig = signature(&operation, &payload);

        if let Some(response) = self.cached_response(&sig, &operation, &options) {
            return response;
        }

        if let Some(pending) = self.inner.in_flight.get(&sig).map(|e| e.value().clone()) {
            debug!(operation = %operation, "Joining identical in-flight call");
            return pending.await;
        }

        if !options.skip_rate_limit && !self.inner.limiter.try_acquire() {
            return self.enqueue(sig, operation, payload, options).await;
        }

        self.launch_or_join(sig, operation, payload, options).await
    }

    fn cached_response(
        &self,
        sig: &str,
        operation: &str,
        options: &CallOptions,
    ) -> Option<CallResponse> {
        if !options.caching_enabled() {
            return None;
        }
        let data = self.inner.responses.lock().get(sig)?;
        self.inner.stats.lock().cached_calls += 1;
        debug!(operation = operation, "Response cache hit");
        Some(CallResponse::from_cache(data))
    }

    /// Park the call until the processor admits it.
    ///
    /// The parked call is registered as in flight, so identical calls made
    /// while it waits join it instead of queuing their own execution.
    fn enqueue(
        &self,
        sig: String,
        operation: String,
        payload: Value,
        options: CallOptions,
    ) -> SharedCall {
        let shared = match self.inner.in_flight.entry(sig) {
            Entry::Occupied(entry) => {
                debug!(operation = %operation, "Joining identical queued call");
                return entry.get().clone();
            }
            Entry::Vacant(entry) => {
                let (tx, rx) = oneshot::channel();
                let depth = {
                    let mut queue = self.inner.queue.lock();
                    queue.push(operation.clone(), payload, options, tx);
                    queue.len()
                };
                self.inner.stats.lock().rate_limit_hits += 1;
                debug!(operation = %operation, queue_depth = depth, "Rate limited, queuing call");

                let shared = async move {
                    rx.await.unwrap_or_else(|_| {
                        CallResponse::failure(
                            &RemoteError::new(ErrorCode::Cancelled, "Queued call was dropped"),
                            Duration::ZERO,
                            0,
                        )
                    })
                }
                .boxed()
                .shared();

                entry.insert(shared.clone());
                shared
            }
        };

        self.spawn_queue_processor();
        shared
    }

    fn spawn_queue_processor(&self) {
        if self.inner.processing.swap(true, Ordering::SeqCst) {
            return;
        }
        let client = self.clone();
        tokio::spawn(async move { client.process_queue().await });
    }

    /// Admit queued calls one at a time under the limiter.
    async fn process_queue(&self) {
        let poll = self.inner.config.rate_limit.queue_poll_interval;
        loop {
            {
                let queue = self.inner.queue.lock();
                if queue.is_empty() {
                    // Cleared under the queue lock so a concurrent push either
                    // sees the flag down or is seen by this check.
                    self.inner.processing.store(false, Ordering::SeqCst);
                    return;
                }
            }

            if !self.inner.limiter.try_acquire() {
                tokio::time::sleep(poll).await;
                continue;
            }

            let Some(request) = self.inner.queue.lock().pop() else {
                continue;
            };
            debug!(
                operation = %request.operation,
                priority = request.priority,
                waited_ms = request.enqueued_at.elapsed().as_millis() as u64,
                "Admitting queued call"
            );

            let client = self.clone();
            tokio::spawn(async move { client.run_admitted(request).await });
        }
    }

    /// Execute an admitted call and hand the result to everyone waiting on it.
    ///
    /// The call's in-flight entry is the handle created by [`Self::enqueue`],
    /// so it runs here directly rather than through `dispatch`.
    async fn run_admitted(&self, request: QueuedRequest) {
        let QueuedRequest {
            operation,
            payload,
            options,
            responder,
            ..
        } = request;
        let sig = signature(&operation, &payload);

        let response = match self.cached_response(&sig, &operation, &options) {
            Some(response) => {
                self.inner.in_flight.remove(&sig);
                response
            }
            None => {
                let response = self
                    .inner
                    .execute(&operation, &payload, &options, CallPhase::Queued)
                    .await;
                self.inner.settle(&sig, &operation, &options, &response);
                response
            }
        };

        // Every caller may have gone away.
        let _ = responder.send(response);
    }

    /// Start an execution for `sig`, or join the one already running.
    fn launch_or_join(
        &self,
        sig: String,
        operation: String,
        payload: Value,
        options: CallOptions,
    ) -> SharedCall {
        match self.inner.in_flight.entry(sig) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let inner = Arc::clone(&self.inner);
                let key = entry.key().clone();
                let handle = tokio::spawn(async move {
                    let response = inner
                        .execute(&operation, &payload, &options, CallPhase::Pending)
                        .await;
                    inner.settle(&key, &operation, &options, &response);
                    response
                });

                let shared = async move {
                    handle.await.unwrap_or_else(|e| {
                        CallResponse::failure(
                            &RemoteError::internal(format!("Call task failed: {e}")),
                            Duration::ZERO,
                            0,
                        )
                    })
                }
                .boxed()
                .shared();

                entry.insert(shared.clone());
                shared
            }
        }
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) -> usize {
        let removed = self.inner.responses.lock().clear();
        self.inner.publisher.emit(OfficeEvent::CacheUpdated {
            cache_key: "all".to_string(),
            action: CacheAction::Clear,
        });
        info!(removed = removed, "Response cache cleared");
        removed
    }

    /// Drop the cached response for one call.
    pub fn clear_cache_entry(&self, operation: &str, payload: &Value) -> bool {
        let sig = signature(operation, payload);
        let removed = self.inner.responses.lock().remove(&sig);
        self.inner.publisher.emit(OfficeEvent::CacheUpdated {
            cache_key: sig,
            action: CacheAction::Delete,
        });
        removed
    }

    #[must_use]
    pub fn stats(&self) -> CallClientStats {
        let queued = self.queue_len();
        self.inner.stats.lock().snapshot(queued)
    }

    pub fn reset_stats(&self) {
        *self.inner.stats.lock() = StatsState::default();
    }

    /// Executions currently running.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight.len()
    }

    /// Calls waiting for admission.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.inner.queue.lock().len()
    }
}

impl Inner {
    /// Attempt, classify, back off, repeat.
    ///
    /// `from` is the phase the call reached before execution: `Pending` when
    /// admitted on arrival, `Queued` when admitted by the processor.
    async fn execute(
        &self,
        operation: &str,
        payload: &Value,
        options: &CallOptions,
        from: CallPhase,
    ) -> CallResponse {
        let started = Instant::now();
        let max_retries = options.retries.unwrap_or(self.config.retry.max_retries);
        let timeout = options.timeout.unwrap_or(self.config.default_timeout);

        let mut phase = from;
        advance(&mut phase, CallPhase::Executing { attempt: 0 });
        let mut retries = 0;

        loop {
            let error = match self.attempt(operation, payload, timeout).await {
                Ok(data) => {
                    advance(&mut phase, CallPhase::Settled { success: true });
                    debug!(operation = operation, retries = retries, "Call succeeded");
                    return CallResponse::success(data, started.elapsed(), retries);
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                advance(&mut phase, CallPhase::Settled { success: false });
                debug!(operation = operation, code = %error.code, "Non-retryable failure");
                return CallResponse::failure(&error, started.elapsed(), retries);
            }

            if let Some(hook) = &options.on_error {
                hook(&error);
            }

            if retries >= max_retries {
                advance(&mut phase, CallPhase::Settled { success: false });
                warn!(
                    operation = operation,
                    retries = retries,
                    error = %error,
                    "Retries exhausted"
                );
                return CallResponse::failure(&error, started.elapsed(), retries);
            }

            let attempt = retries + 1;
            let delay = self.config.retry.backoff(attempt);
            advance(&mut phase, CallPhase::Retrying { attempt, delay });
            debug!(
                operation = operation,
                attempt = attempt,
                max_retries = max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying after backoff"
            );

            tokio::time::sleep(delay).await;
            retries = attempt;
            advance(&mut phase, CallPhase::Executing { attempt });
        }
    }

    /// One invocation raced against `timeout`.
    ///
    /// Losing the race does not cancel the invocation; it keeps running on
    /// its own task and its result is discarded.
    async fn attempt(
        &self,
        operation: &str,
        payload: &Value,
        timeout: Duration,
    ) -> Result<Value, RemoteError> {
        let invoker = Arc::clone(&self.invoker);
        let op = operation.to_string();
        let payload = payload.clone();
        let handle = tokio::spawn(async move { invoker.invoke(&op, &payload).await });

        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(RemoteError::internal(format!("Invoker task failed: {e}"))),
            Err(_) => {
                warn!(
                    operation = operation,
                    timeout_ms = timeout.as_millis() as u64,
                    "Call timed out"
                );
                Err(RemoteError::timeout(timeout))
            }
        }
    }

    /// Cache, count, notify, then release the in-flight slot.
    fn settle(&self, sig: &str, operation: &str, options: &CallOptions, response: &CallResponse) {
        if let Some(data) = response.data() {
            if options.caching_enabled() {
                self.responses
                    .lock()
                    .insert(sig.to_string(), data.clone(), options.cache_ttl);
                self.publisher.emit(OfficeEvent::CacheUpdated {
                    cache_key: sig.to_string(),
                    action: CacheAction::Add,
                });
            }
        }

        self.stats
            .lock()
            .record_settled(response.is_success(), response.duration, response.retries);

        let duration_ms = response.duration.as_secs_f64() * 1000.0;
        match response.data() {
            Some(data) => self.publisher.emit(OfficeEvent::DataLoaded {
                data_type: operation.to_string(),
                record_count: record_count(data),
                duration: duration_ms,
            }),
            None => self.publisher.emit(OfficeEvent::system_error(
                response.error().unwrap_or("Unknown error"),
                format!("Remote operation: {operation}"),
                Severity::High,
            )),
        }

        self.in_flight.remove(sig);
    }
}

fn advance(phase: &mut CallPhase, next: CallPhase) {
    debug_assert!(
        phase.can_transition_to(next),
        "illegal call phase step {phase:?} -> {next:?}"
    );
    trace!(from = ?phase, to = ?next, "Call phase");
    *phase = next;
}

fn record_count(data: &Value) -> usize {
    match data {
        Value::Array(items) => items.len(),
        _ => 1,
    }
}
