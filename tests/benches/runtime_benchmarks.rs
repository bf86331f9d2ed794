//! # Law-Office Runtime Benchmarks
//!
//! | Component | Path | Target |
//! |-----------|------|--------|
//! | shared-bus | `emit` with N listeners | < 10µs for 10 listeners |
//! | lo-01 | signature of a typical payload | < 2µs |
//! | lo-01 | response-cache hit through `call` | < 20µs |
//! | lo-02 | fresh hit through `get` | < 20µs |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lo_01_call_client::{signature, CallClient, CallClientConfig, CallOptions, FnInvoker};
use lo_02_data_cache::{DataCacheConfig, GetOptions, SwrCache};
use serde_json::{json, Value};
use shared_bus::{CacheAction, EventBus, EventName, ListenerOptions, OfficeEvent};
use std::sync::Arc;
use std::time::Duration;

fn bench_bus_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared-bus");

    for listeners in [1usize, 10, 50] {
        let bus = EventBus::new();
        for priority in 0..listeners {
            bus.on(
                EventName::CacheUpdated,
                |event| {
                    black_box(event);
                    Ok(())
                },
                ListenerOptions::priority(priority as i32),
            );
        }

        group.bench_with_input(BenchmarkId::new("emit", listeners), &listeners, |b, _| {
            b.iter(|| {
                bus.emit(OfficeEvent::CacheUpdated {
                    cache_key: "clients".to_string(),
                    action: CacheAction::Add,
                })
            })
        });
    }

    group.finish();
}

fn bench_signature(c: &mut Criterion) {
    let payload = json!({
        "clientId": "c-1042",
        "from": "2026-01-01",
        "to": "2026-03-31",
        "includeArchived": false,
    });

    c.bench_function("lo-01/signature", |b| {
        b.iter(|| signature(black_box("getTimesheet"), black_box(&payload)))
    });
}

fn bench_client_cache_hit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    let invoker = Arc::new(FnInvoker::new(|_op, _payload| {
        Box::pin(async { Ok::<_, lo_01_call_client::RemoteError>(json!([1, 2, 3])) })
            as futures::future::BoxFuture<'static, _>
    }));
    let client = CallClient::new(CallClientConfig::default(), invoker, Arc::new(EventBus::new()))
        .expect("client");
    let options = || CallOptions::default().with_cache_ttl(Duration::from_secs(3600));
    rt.block_on(client.call("getRates", Value::Null, options()));

    c.bench_function("lo-01/response-cache-hit", |b| {
        b.iter(|| rt.block_on(client.call("getRates", Value::Null, options())))
    });
}

fn bench_cache_fresh_hit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    let cache: SwrCache<Value> = SwrCache::new(DataCacheConfig::default()).expect("cache");
    rt.block_on(cache.get("clients", || async { Ok(json!([])) }, GetOptions::default()))
        .expect("warm");

    c.bench_function("lo-02/fresh-hit", |b| {
        b.iter(|| {
            rt.block_on(cache.get("clients", || async { Ok(json!([])) }, GetOptions::default()))
        })
    });
}

criterion_group!(
    benches,
    bench_bus_emit,
    bench_signature,
    bench_client_cache_hit,
    bench_cache_fresh_hit
);
criterion_main!(benches);
