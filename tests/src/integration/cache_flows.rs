//! # Data Cache Flows
//!
//! Freshness bands, coalescing and storage fallback, observed through the
//! bus and a controllable clock.

#[cfg(test)]
mod tests {
    use crate::support::Recorder;
    use lo_02_data_cache::{
        CacheError, DataCacheConfig, GetOptions, InMemoryKeyValueStore, KeyValueStore,
        MockTimeSource, StorageKind, SwrCache,
    };
    use serde_json::{json, Value};
    use shared_bus::{CacheAction, EventBus, EventName, OfficeEvent};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    // =============================================================================
    // FIXTURES
    // =============================================================================

    struct Harness {
        cache: SwrCache<Value>,
        clock: Arc<MockTimeSource>,
        bus: Arc<EventBus>,
        fetches: Arc<AtomicU32>,
    }

    impl Harness {
        fn new(config: DataCacheConfig) -> Self {
            Self::with_store(config, None)
        }

        fn with_store(config: DataCacheConfig, kv: Option<Arc<dyn KeyValueStore>>) -> Self {
            let clock = Arc::new(MockTimeSource::new(0));
            let bus = Arc::new(EventBus::new());
            let mut builder = SwrCache::builder(config)
                .time_source(clock.clone())
                .event_publisher(bus.clone());
            if let Some(kv) = kv {
                builder = builder.key_value_store(kv);
            }
            Self {
                cache: builder.build().unwrap(),
                clock,
                bus,
                fetches: Arc::new(AtomicU32::new(0)),
            }
        }

        /// Fetch returning `{"version": n}` where `n` counts fetches.
        async fn get(&self, key: &str) -> Result<Value, CacheError> {
            let fetches = self.fetches.clone();
            self.cache
                .get(
                    key,
                    move || async move {
                        let n = fetches.fetch_add(1, Ordering::SeqCst) + 1;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Ok(json!({ "version": n }))
                    },
                    GetOptions::default(),
                )
                .await
        }

        fn fetches(&self) -> u32 {
            self.fetches.load(Ordering::SeqCst)
        }

        async fn settle(&self) {
            while self.cache.pending_revalidations() > 0 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        }
    }

    fn short_lived() -> DataCacheConfig {
        DataCacheConfig {
            max_age: Duration::from_millis(100),
            stale_age: Duration::from_millis(200),
            ..DataCacheConfig::default()
        }
    }

    // =============================================================================
    // FRESHNESS BANDS
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_fresh_stale_expired_timeline() {
        let h = Harness::new(short_lived());

        assert_eq!(h.get("clients").await.unwrap(), json!({ "version": 1 }));

        h.clock.set(50);
        assert_eq!(h.get("clients").await.unwrap(), json!({ "version": 1 }));
        assert_eq!(h.fetches(), 1);

        h.clock.set(150);
        assert_eq!(h.get("clients").await.unwrap(), json!({ "version": 1 }));
        assert_eq!(h.get("clients").await.unwrap(), json!({ "version": 1 }));
        h.settle().await;
        assert_eq!(h.fetches(), 2);
        assert_eq!(h.cache.stats().revalidations, 1);

        // The refreshed entry is stamped at t=150; 350ms past it is expired.
        h.clock.set(500);
        assert_eq!(h.get("clients").await.unwrap(), json!({ "version": 3 }));
        assert_eq!(h.fetches(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_read_blocks_for_fresh_data() {
        let h = Harness::new(short_lived());
        h.get("tasks").await.unwrap();

        h.clock.set(350);
        let value = h.get("tasks").await.unwrap();

        assert_eq!(value, json!({ "version": 2 }));
        assert_eq!(h.cache.stats().misses, 2);
        assert_eq!(h.cache.stats().revalidations, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_data_preferred_over_failure() {
        let h = Harness::new(short_lived());
        h.get("budget").await.unwrap();
        h.clock.set(150);

        let value = h
            .cache
            .get(
                "budget",
                || async { Err(CacheError::fetch("backend down")) },
                GetOptions::default(),
            )
            .await
            .unwrap();
        h.settle().await;

        assert_eq!(value, json!({ "version": 1 }));
        assert_eq!(h.cache.stats().errors, 1);
        // The stale entry survives the failed refresh.
        assert_eq!(h.cache.stats().size, 1);
    }

    // =============================================================================
    // COALESCING
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_two_reads_within_window_fetch_once() {
        let h = Harness::new(DataCacheConfig {
            max_age: Duration::from_secs(1),
            ..DataCacheConfig::default()
        });

        let (a, b) = tokio::join!(h.get("x"), async {
            h.clock.advance(50);
            h.get("x").await
        });

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(h.fetches(), 1);
    }

    // =============================================================================
    // INVALIDATION
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_is_idempotent() {
        let h = Harness::new(short_lived());
        let updates = Recorder::attach(&h.bus, EventName::CacheUpdated);

        assert!(!h.cache.invalidate("missing"));
        assert!(updates.is_empty());

        h.get("matters").await.unwrap();
        assert!(h.cache.invalidate("matters"));
        assert!(!h.cache.invalidate("matters"));

        h.get("matters").await.unwrap();
        assert_eq!(h.fetches(), 2);
        assert_eq!(h.cache.stats().misses, 2);

        let actions: Vec<CacheAction> = updates
            .events()
            .into_iter()
            .filter_map(|event| match event {
                OfficeEvent::CacheUpdated { action, .. } => Some(action),
                _ => None,
            })
            .collect();
        assert_eq!(actions, vec![CacheAction::Add, CacheAction::Delete, CacheAction::Add]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_discards_running_revalidation() {
        let h = Harness::new(short_lived());
        h.get("calendar").await.unwrap();
        h.clock.set(150);

        h.get("calendar").await.unwrap();
        assert_eq!(h.cache.pending_revalidations(), 1);
        assert!(h.cache.invalidate("calendar"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.cache.stats().size, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_empties_namespace() {
        let h = Harness::new(short_lived());
        h.get("a").await.unwrap();
        h.get("b").await.unwrap();

        assert_eq!(h.cache.clear(), 2);
        assert_eq!(h.cache.stats().size, 0);
    }

    // =============================================================================
    // PERSISTENT STORAGE
    // =============================================================================

    fn persistent() -> DataCacheConfig {
        DataCacheConfig {
            storage: StorageKind::Persistent,
            namespace: "office".to_string(),
            ..short_lived()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_persisted_layout() {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        let h = Harness::with_store(persistent(), Some(kv.clone()));
        assert_eq!(h.cache.storage_kind(), StorageKind::Persistent);

        h.clock.set(1_000);
        h.get("clients").await.unwrap();

        let raw = kv.get_item("office:clients").unwrap().unwrap();
        let record: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(record["data"], json!({ "version": 1 }));
        assert_eq!(record["timestamp"], json!(1_000));
        assert_eq!(record["expiresAt"], json!(1_100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_backend_falls_back_to_memory() {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        kv.set_available(false);
        let h = Harness::with_store(persistent(), Some(kv.clone()));

        assert_eq!(h.cache.storage_kind(), StorageKind::Memory);
        h.get("clients").await.unwrap();
        h.get("clients").await.unwrap();
        assert_eq!(h.fetches(), 1);
        assert!(kv.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_exhaustion_keeps_entry_in_memory() {
        let kv = Arc::new(InMemoryKeyValueStore::with_quota(1));
        let h = Harness::with_store(persistent(), Some(kv.clone()));

        h.get("first").await.unwrap();
        h.get("second").await.unwrap();
        assert_eq!(h.cache.stats().errors, 1);

        h.get("second").await.unwrap();
        assert_eq!(h.fetches(), 2);
        assert_eq!(kv.len(), 1);
    }
}
