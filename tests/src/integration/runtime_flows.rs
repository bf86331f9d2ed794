//! # Runtime Flows
//!
//! The composed runtime: a cache lookup whose fetch is a resilient call,
//! with both services reporting to the same bus.

#[cfg(test)]
mod tests {
    use crate::support::{Recorder, ScriptedInvoker};
    use futures::future::join_all;
    use lo_01_call_client::{CallOptions, RemoteError};
    use lo_02_data_cache::{CacheError, GetOptions};
    use lo_runtime::{OfficeRuntime, RuntimeConfig};
    use serde_json::{json, Value};
    use shared_bus::{EventName, OfficeEvent};
    use std::sync::Arc;
    use std::time::Duration;

    const CONFIG: &str = r#"
        [bus]
        history_capacity = 50

        [client.rate_limit]
        max_requests_per_window = 2
        window = "1s"

        [client.retry]
        max_retries = 2
        base_delay = "100ms"
        max_delay = "1s"

        [cache]
        max_age = "5m"
        stale_age = "10m"
    "#;

    fn runtime(invoker: ScriptedInvoker) -> (OfficeRuntime, Arc<ScriptedInvoker>) {
        let config = RuntimeConfig::parse(CONFIG).unwrap();
        let invoker = Arc::new(invoker);
        let runtime = OfficeRuntime::new(config, invoker.clone()).unwrap();
        (runtime, invoker)
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_lookups_share_one_call() {
        let (runtime, invoker) =
            runtime(ScriptedInvoker::ok(json!([{ "id": 1 }, { "id": 2 }])).with_delay(Duration::from_millis(50)));
        let loaded = Recorder::attach(runtime.bus(), EventName::DataLoaded);

        let lookups = (0..4).map(|_| runtime.call_cached("clients", "getClients", json!({}), CallOptions::default()));
        let results = join_all(lookups).await;

        assert!(results.iter().all(|r| r.as_ref().unwrap() == &json!([{ "id": 1 }, { "id": 2 }])));
        assert_eq!(invoker.calls(), 1);

        let events = loaded.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            OfficeEvent::DataLoaded { data_type, record_count: 2, .. } if data_type == "getClients"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_misses_still_resolve() {
        let (runtime, invoker) = runtime(ScriptedInvoker::ok(json!({})));

        let keys = ["a", "b", "c", "d"];
        let lookups = keys
            .iter()
            .map(|key| runtime.call_cached(key, key, Value::Null, CallOptions::default()));
        let results = join_all(lookups).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(invoker.calls(), 4);
        assert_eq!(runtime.client().stats().rate_limit_hits, 2);
        assert_eq!(runtime.cache().stats().size, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retried_call_fills_cache() {
        let (runtime, invoker) = runtime(
            ScriptedInvoker::ok(json!({ "total": 12 }))
                .with_script(vec![Err(RemoteError::unavailable("cold start"))]),
        );

        let first = runtime
            .call_cached("timesheet", "getTimesheet", json!({ "week": 41 }), CallOptions::default())
            .await
            .unwrap();
        let second = runtime
            .call_cached("timesheet", "getTimesheet", json!({ "week": 41 }), CallOptions::default())
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(invoker.calls(), 2);
        assert_eq!(runtime.client().stats().retried_calls, 1);
        assert_eq!(runtime.cache().stats().hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_failure_surfaces_as_fetch_error() {
        let (runtime, _invoker) =
            runtime(ScriptedInvoker::failing(RemoteError::invalid_argument("bad week")));
        let errors = Recorder::attach(runtime.bus(), EventName::SystemError);

        let err = runtime
            .call_cached("timesheet", "getTimesheet", json!({ "week": -1 }), CallOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CacheError::Fetch(ref message) if message.contains("invalid-argument")));
        assert_eq!(errors.len(), 1);
        assert_eq!(runtime.cache().stats().errors, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_refresh_replaces_entry() {
        let (runtime, invoker) = runtime(
            ScriptedInvoker::ok(json!("v2")).with_script(vec![Ok(json!("v1"))]),
        );

        let first = runtime
            .call_cached("rates", "getRates", Value::Null, CallOptions::default())
            .await
            .unwrap();
        let refreshed = runtime
            .call_cached_with("rates", "getRates", Value::Null, CallOptions::default(), GetOptions::force())
            .await
            .unwrap();
        let cached = runtime
            .call_cached("rates", "getRates", Value::Null, CallOptions::default())
            .await
            .unwrap();

        assert_eq!(first, json!("v1"));
        assert_eq!(refreshed, json!("v2"));
        assert_eq!(cached, json!("v2"));
        assert_eq!(invoker.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_records_both_services() {
        let (runtime, _invoker) = runtime(ScriptedInvoker::ok(json!([])));

        runtime
            .call_cached("tasks", "getTasks", Value::Null, CallOptions::default())
            .await
            .unwrap();

        let names: Vec<EventName> = runtime
            .bus()
            .history()
            .into_iter()
            .map(|record| record.event.name())
            .collect();
        assert!(names.contains(&EventName::DataLoaded));
        assert!(names.contains(&EventName::CacheUpdated));
    }
}
