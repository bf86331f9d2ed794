//! # Call Client Flows
//!
//! The call client driven end to end against a scripted invoker, with every
//! settlement observed on a real event bus.

#[cfg(test)]
mod tests {
    use crate::support::{Recorder, ScriptedInvoker};
    use futures::future::join_all;
    use lo_01_call_client::{
        CallClient, CallClientConfig, CallOptions, ErrorCode, RateLimitConfig, RemoteError,
    };
    use serde_json::{json, Value};
    use shared_bus::{EventBus, EventName, ListenerOptions, OfficeEvent, Severity};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    // =============================================================================
    // FIXTURES
    // =============================================================================

    fn wire(config: CallClientConfig, invoker: ScriptedInvoker) -> (CallClient, Arc<EventBus>, Arc<ScriptedInvoker>) {
        let bus = Arc::new(EventBus::new());
        let invoker = Arc::new(invoker);
        let client = CallClient::new(config, invoker.clone(), bus.clone()).unwrap();
        (client, bus, invoker)
    }

    fn limited(capacity: u32) -> CallClientConfig {
        CallClientConfig {
            rate_limit: RateLimitConfig {
                max_requests_per_window: capacity,
                ..RateLimitConfig::default()
            },
            ..CallClientConfig::default()
        }
    }

    // =============================================================================
    // DEDUPLICATION
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_identical_concurrent_calls_execute_once() {
        let (client, bus, invoker) = wire(
            CallClientConfig::default(),
            ScriptedInvoker::ok(json!([1, 2, 3])).with_delay(Duration::from_millis(200)),
        );
        let loaded = Recorder::attach(&bus, EventName::DataLoaded);

        let calls = (0..5).map(|_| client.call("getClients", json!({ "active": true }), CallOptions::default()));
        let responses = join_all(calls).await;

        assert_eq!(invoker.calls(), 1);
        assert!(responses.iter().all(|r| r.is_success()));
        assert!(responses.iter().all(|r| r.data() == Some(&json!([1, 2, 3]))));
        assert_eq!(loaded.len(), 1);
        assert_eq!(client.in_flight_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_payloads_are_not_merged() {
        let (client, _bus, invoker) = wire(
            CallClientConfig::default(),
            ScriptedInvoker::ok(json!(true)).with_delay(Duration::from_millis(50)),
        );

        let responses = join_all([
            client.call("getTask", json!({ "id": 1 }), CallOptions::default()),
            client.call("getTask", json!({ "id": 2 }), CallOptions::default()),
        ])
        .await;

        assert_eq!(invoker.calls(), 2);
        assert!(responses.iter().all(|r| r.is_success()));
    }

    // =============================================================================
    // RATE LIMITING
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_overflow_waits_for_window_in_priority_order() {
        let (client, _bus, invoker) = wire(limited(2), ScriptedInvoker::ok(json!("ok")));
        let started = Instant::now();

        let calls = [
            ("first", 0),
            ("second", 0),
            ("low", 0),
            ("high", 5),
            ("mid", 2),
        ]
        .map(|(op, priority)| client.call(op, Value::Null, CallOptions::default().with_priority(priority)));
        let responses = join_all(calls).await;

        assert!(responses.iter().all(|r| r.is_success()));
        assert_eq!(invoker.log(), vec!["first", "second", "high", "mid", "low"]);
        // Two windows were needed for the three overflow calls.
        assert!(started.elapsed() >= Duration::from_secs(2));

        let stats = client.stats();
        assert_eq!(stats.rate_limit_hits, 3);
        assert_eq!(stats.queued_requests, 0);
        assert_eq!(stats.successful_calls, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_rate_limit_bypasses_queue() {
        let (client, _bus, invoker) = wire(limited(1), ScriptedInvoker::ok(json!("ok")));
        let started = Instant::now();

        let responses = join_all([
            client.call("a", Value::Null, CallOptions::default()),
            client.call("b", Value::Null, CallOptions::default().skip_rate_limit()),
        ])
        .await;

        assert!(responses.iter().all(|r| r.is_success()));
        assert_eq!(invoker.calls(), 2);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(client.stats().rate_limit_hits, 0);
    }

    // =============================================================================
    // RETRY / BACKOFF
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_then_success() {
        let (client, bus, _invoker) = wire(
            CallClientConfig::default(),
            ScriptedInvoker::ok(json!({ "id": 9 })).with_script(vec![
                Err(RemoteError::unavailable("backend restarting")),
                Err(RemoteError::new(ErrorCode::Network, "network unreachable")),
            ]),
        );
        let errors = Recorder::attach(&bus, EventName::SystemError);
        let hook_calls = Arc::new(AtomicU32::new(0));
        let counter = hook_calls.clone();
        let started = Instant::now();

        let response = client
            .call(
                "getClient",
                json!({ "id": 9 }),
                CallOptions::default().on_error(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await;

        assert!(response.is_success());
        assert_eq!(response.retries, 2);
        assert_eq!(hook_calls.load(Ordering::SeqCst), 2);
        // 1s then 2s of backoff.
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert!(errors.is_empty());
        assert_eq!(client.stats().retried_calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_failure_never_retries() {
        let (client, bus, invoker) = wire(
            CallClientConfig::default(),
            ScriptedInvoker::failing(RemoteError::permission_denied("not your matter")),
        );
        let errors = Recorder::attach(&bus, EventName::SystemError);

        let response = client.call("deleteMatter", json!({ "id": 3 }), CallOptions::default()).await;

        assert!(!response.is_success());
        assert_eq!(response.error_code(), Some(ErrorCode::PermissionDenied));
        assert_eq!(response.retries, 0);
        assert_eq!(invoker.calls(), 1);

        let events = errors.events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            OfficeEvent::SystemError(payload) => {
                assert_eq!(payload.severity, Severity::High);
                assert!(payload.context.contains("deleteMatter"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_report_last_error() {
        let (client, _bus, invoker) = wire(
            CallClientConfig::default(),
            ScriptedInvoker::failing(RemoteError::unavailable("down")),
        );

        let response = client
            .call("getTasks", Value::Null, CallOptions::default().with_retries(2))
            .await;

        assert_eq!(response.error_code(), Some(ErrorCode::Unavailable));
        assert_eq!(response.retries, 2);
        assert_eq!(invoker.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_retryable_and_does_not_cancel() {
        let (client, _bus, invoker) = wire(
            CallClientConfig::default(),
            ScriptedInvoker::ok(json!("late")).with_delay(Duration::from_secs(5)),
        );

        let response = client
            .call(
                "slowReport",
                Value::Null,
                CallOptions::default()
                    .with_timeout(Duration::from_secs(1))
                    .with_retries(1),
            )
            .await;

        assert_eq!(response.error_code(), Some(ErrorCode::Timeout));
        assert_eq!(response.retries, 1);
        assert_eq!(invoker.calls(), 2);
    }

    // =============================================================================
    // RESPONSE CACHE
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_cached_response_skips_invoker_and_limiter() {
        let (client, bus, invoker) = wire(limited(1), ScriptedInvoker::ok(json!([1])));
        let updates = Recorder::attach(&bus, EventName::CacheUpdated);
        let options = || CallOptions::default().with_cache_ttl(Duration::from_secs(60));

        let first = client.call("getRates", Value::Null, options()).await;
        let second = client.call("getRates", Value::Null, options()).await;

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(invoker.calls(), 1);
        assert_eq!(client.stats().rate_limit_hits, 0);
        assert_eq!(updates.len(), 1);

        assert_eq!(client.clear_cache(), 1);
        assert_eq!(updates.len(), 2);
    }

    // =============================================================================
    // LISTENER ISOLATION
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_failing_listener_does_not_block_others() {
        let (client, bus, _invoker) = wire(CallClientConfig::default(), ScriptedInvoker::ok(json!({})));
        let errors = Recorder::attach(&bus, EventName::SystemError);
        let reached = Arc::new(AtomicU32::new(0));

        bus.on(
            EventName::DataLoaded,
            |_| Err("banner widget crashed".into()),
            ListenerOptions::priority(10),
        );
        let counter = reached.clone();
        bus.on(
            EventName::DataLoaded,
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            ListenerOptions::priority(1),
        );

        let response = client.call("getDashboard", Value::Null, CallOptions::default()).await;

        assert!(response.is_success());
        assert_eq!(reached.load(Ordering::SeqCst), 1);
        assert_eq!(errors.len(), 1);
    }
}
