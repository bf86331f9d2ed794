//! Stale-While-Revalidate Cache Service
//!
//! ```text
//! get(key, fetch)
//!   │
//!   ├─ force ──────────────────────────────► fetch, store, return
//!   ├─ no entry / expired ─► miss ─────────► fetch (coalesced), store, return
//!   ├─ fresh ──────────────────────────────► return stored
//!   └─ stale ─► return stored ─┐
//!                              └─► background fetch (one per key) ─► store
//! ```

use crate::adapters::memory::MemoryStore;
use crate::adapters::persistent::PersistentStore;
use crate::domain::config::{DataCacheConfig, StorageKind};
use crate::domain::entry::{CacheEntry, Freshness};
use crate::domain::error::{CacheError, ConfigError};
use crate::domain::stats::{CacheStats, StatsState};
use crate::ports::outbound::{CacheStore, KeyValueStore, SystemTimeSource, TimeSource};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_bus::{CacheAction, EventPublisher, OfficeEvent};
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Invoked with every fetch or revalidation failure.
pub type CacheErrorHook = Arc<dyn Fn(&CacheError) + Send + Sync>;

type SharedFetch<T> = Shared<BoxFuture<'static, Result<T, CacheError>>>;

/// Per-lookup overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetOptions {
    /// Always fetch and overwrite.
    pub force: bool,
    /// Replaces the configured `max_age` for this lookup only.
    pub max_age: Option<Duration>,
}

impl GetOptions {
    #[must_use]
    pub fn force() -> Self {
        Self {
            force: true,
            max_age: None,
        }
    }

    #[must_use]
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            force: false,
            max_age: Some(max_age),
        }
    }
}

struct CacheInner<T> {
    config: DataCacheConfig,
    store: Box<dyn CacheStore<T>>,
    /// Receives entries the primary store refused to write.
    fallback: MemoryStore<T>,
    clock: Arc<dyn TimeSource>,
    publisher: Option<Arc<dyn EventPublisher>>,
    on_error: CacheErrorHook,
    stats: Mutex<StatsState>,
    /// Key -> token of the revalidation currently allowed to write back.
    revalidations: Mutex<HashMap<String, u64>>,
    misses: Mutex<HashMap<String, SharedFetch<T>>>,
    next_token: AtomicU64,
}

/// Keyed cache with fresh/stale/expired semantics and background refresh.
///
/// Cheap to clone; clones share storage, statistics and pending work.
pub struct SwrCache<T> {
    inner: Arc<CacheInner<T>>,
}

impl<T> Clone for SwrCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Builder for [`SwrCache`].
pub struct SwrCacheBuilder<T> {
    config: DataCacheConfig,
    key_value_store: Option<Arc<dyn KeyValueStore>>,
    clock: Option<Arc<dyn TimeSource>>,
    publisher: Option<Arc<dyn EventPublisher>>,
    on_error: Option<CacheErrorHook>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SwrCacheBuilder<T>
where
    T: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    /// Backend used when `storage = persistent`.
    #[must_use]
    pub fn key_value_store(mut self, kv: Arc<dyn KeyValueStore>) -> Self {
        self.key_value_store = Some(kv);
        self
    }

    #[must_use]
    pub fn time_source(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Announce stores, invalidations and clears as `system:cache-updated`.
    #[must_use]
    pub fn event_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    #[must_use]
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CacheError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Result<SwrCache<T>, ConfigError> {
        self.config.validate()?;
        let config = self.config;

        let store: Box<dyn CacheStore<T>> = match (config.storage, self.key_value_store) {
            (StorageKind::Memory, _) => Box::new(MemoryStore::new()),
            (StorageKind::Persistent, Some(kv)) => {
                let persistent = PersistentStore::new(kv, &config.namespace);
                match persistent.check_writable() {
                    Ok(()) => Box::new(persistent),
                    Err(e) => {
                        warn!(error = %e, "Persistent storage not available, falling back to memory");
                        Box::new(MemoryStore::new())
                    }
                }
            }
            (StorageKind::Persistent, None) => {
                warn!("No persistent backend supplied, falling back to memory");
                Box::new(MemoryStore::new())
            }
        };

        info!(
            max_age_ms = config.max_age.as_millis() as u64,
            stale_age_ms = config.stale_age.as_millis() as u64,
            storage = ?store.kind(),
            stale_while_revalidate = config.stale_while_revalidate,
            "Data cache initialized"
        );

        let clock: Arc<dyn TimeSource> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemTimeSource),
        };
        let on_error: CacheErrorHook = match self.on_error {
            Some(hook) => hook,
            None => Arc::new(|e: &CacheError| error!(error = %e, "Data cache error")),
        };

        Ok(SwrCache {
            inner: Arc::new(CacheInner {
                config,
                store,
                fallback: MemoryStore::new(),
                clock,
                publisher: self.publisher,
                on_error,
                stats: Mutex::new(StatsState::default()),
                revalidations: Mutex::new(HashMap::new()),
                misses: Mutex::new(HashMap::new()),
                next_token: AtomicU64::new(0),
            }),
        })
    }
}

impl<T> SwrCache<T>
where
    T: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    /// In-memory cache with the system clock.
    pub fn new(config: DataCacheConfig) -> Result<Self, ConfigError> {
        Self::builder(config).build()
    }

    pub fn builder(config: DataCacheConfig) -> SwrCacheBuilder<T> {
        SwrCacheBuilder {
            config,
            key_value_store: None,
            clock: None,
            publisher: None,
            on_error: None,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn config(&self) -> &DataCacheConfig {
        &self.inner.config
    }

    /// Backend actually in use after any fallback.
    #[must_use]
    pub fn storage_kind(&self) -> StorageKind {
        self.inner.store.kind()
    }

    /// Return cached data for `key`, fetching with `fetch` when needed.
    ///
    /// A stale hit returns immediately; the refresh runs on its own task, so
    /// this future never waits for it.
    pub async fn get<F, Fut>(&self, key: &str, fetch: F, options: GetOptions) -> Result<T, CacheError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, CacheError>> + Send + 'static,
    {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        if options.force {
            info!(cache_key = key, "Forced fetch");
            return self.inner.fetch_and_store(key, fetch).await;
        }

        let Some(entry) = self.inner.read_entry(key) else {
            self.inner.stats.lock().misses += 1;
            debug!(cache_key = key, "Cache miss");
            return self.fetch_coalesced(key, fetch).await;
        };

        let max_age = options.max_age.unwrap_or(self.inner.config.max_age);
        let age = entry.age(self.inner.clock.now_millis());

        match Freshness::classify(age, max_age, self.inner.config.stale_age) {
            Freshness::Fresh => {
                self.inner.stats.lock().hits += 1;
                debug!(cache_key = key, age_ms = age, "Cache hit (fresh)");
                Ok(entry.data)
            }
            Freshness::Stale if self.inner.config.stale_while_revalidate => {
                self.inner.stats.lock().hits += 1;
                debug!(cache_key = key, age_ms = age, "Cache hit (stale), revalidating");
                self.revalidate_in_background(key, fetch);
                Ok(entry.data)
            }
            Freshness::Stale | Freshness::Expired => {
                self.inner.stats.lock().misses += 1;
                debug!(cache_key = key, age_ms = age, "Cache entry expired");
                self.fetch_coalesced(key, fetch).await
            }
        }
    }

    /// Concurrent misses for one key share a single fetch.
    async fn fetch_coalesced<F, Fut>(&self, key: &str, fetch: F) -> Result<T, CacheError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, CacheError>> + Send + 'static,
    {
        let shared = {
            let mut misses = self.inner.misses.lock();
            match misses.get(key) {
                Some(pending) => {
                    debug!(cache_key = key, "Joining pending fetch");
                    pending.clone()
                }
                None => {
                    let inner = Arc::clone(&self.inner);
                    let owned_key = key.to_string();
                    let handle = tokio::spawn(async move {
                        let result = inner.fetch_and_store(&owned_key, fetch).await;
                        inner.misses.lock().remove(&owned_key);
                        result
                    });
                    let shared = async move {
                        handle.await.unwrap_or_else(|e| {
                            Err(CacheError::fetch(format!("fetch task failed: {e}")))
                        })
                    }
                    .boxed()
                    .shared();
                    misses.insert(key.to_string(), shared.clone());
                    shared
                }
            }
        };
        shared.await
    }

    fn revalidate_in_background<F, Fut>(&self, key: &str, fetch: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, CacheError>> + Send + 'static,
    {
        let token = {
            let mut pending = self.inner.revalidations.lock();
            if pending.contains_key(key) {
                debug!(cache_key = key, "Revalidation already in progress");
                return;
            }
            let token = self.inner.next_token.fetch_add(1, Ordering::SeqCst);
            pending.insert(key.to_string(), token);
            token
        };
        self.inner.stats.lock().revalidations += 1;

        let inner = Arc::clone(&self.inner);
        let key = key.to_string();
        tokio::spawn(async move {
            debug!(cache_key = %key, "Starting background revalidation");
            let result = fetch().await;

            let still_current = {
                let mut pending = inner.revalidations.lock();
                let current = pending.get(&key) == Some(&token);
                if current {
                    pending.remove(&key);
                }
                current
            };

            match result {
                Ok(data) if still_current => {
                    inner.write_entry(&key, data);
                    debug!(cache_key = %key, "Background revalidation complete");
                }
                Ok(_) => debug!(cache_key = %key, "Revalidation result discarded"),
                Err(e) => inner.record_error(&key, &e),
            }
        });
    }

    /// Remove one entry. Returns whether it existed.
    pub fn invalidate(&self, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }

        let in_primary = self.inner.store.remove(key).unwrap_or_else(|e| {
            warn!(cache_key = key, error = %e, "Failed to remove entry");
            false
        });
        let in_fallback = self.inner.fallback.remove(key).unwrap_or(false);
        let cancelled = self.inner.revalidations.lock().remove(key).is_some();

        let found = in_primary || in_fallback;
        info!(cache_key = key, found = found, cancelled_revalidation = cancelled, "Invalidated");
        if found {
            self.inner.publish(key, CacheAction::Delete);
        }
        found
    }

    /// Remove every entry in this cache's namespace.
    pub fn clear(&self) -> usize {
        let primary = self.inner.store.clear().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to clear storage");
            0
        });
        let fallback = self.inner.fallback.clear().unwrap_or(0);
        self.inner.revalidations.lock().clear();

        let count = primary + fallback;
        info!(removed = count, "Cleared all cache entries");
        self.inner.publish("all", CacheAction::Clear);
        count
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let size = self.inner.store.len().unwrap_or(0) + self.inner.fallback.len().unwrap_or(0);
        self.inner.stats.lock().snapshot(size)
    }

    pub fn reset_stats(&self) {
        *self.inner.stats.lock() = StatsState::default();
        info!("Statistics reset");
    }

    /// Background revalidations still running.
    #[must_use]
    pub fn pending_revalidations(&self) -> usize {
        self.inner.revalidations.lock().len()
    }
}

impl<T> CacheInner<T>
where
    T: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    /// The newest copy of `key` across the primary store and the memory
    /// fallback.
    fn read_entry(&self, key: &str) -> Option<CacheEntry<T>> {
        let primary = self.store.get(key).unwrap_or_else(|e| {
            warn!(cache_key = key, error = %e, "Failed to read entry");
            None
        });
        let parked = self.fallback.get(key).ok().flatten();

        match (primary, parked) {
            (Some(primary), Some(parked)) if parked.timestamp >= primary.timestamp => Some(parked),
            (Some(primary), _) => Some(primary),
            (None, parked) => parked,
        }
    }

    fn write_entry(&self, key: &str, data: T) {
        let entry = CacheEntry::new(data, self.clock.now_millis(), self.config.max_age);

        match self.store.set(key, entry.clone()) {
            Ok(()) => {
                // Drop any copy parked in memory by an earlier failed write.
                let _ = self.fallback.remove(key);
            }
            Err(e) => {
                self.stats.lock().errors += 1;
                warn!(cache_key = key, error = %e, "Write failed, keeping entry in memory");
                // The older persisted record must not shadow the parked one.
                if let Err(e) = self.store.remove(key) {
                    debug!(cache_key = key, error = %e, "Could not drop persisted copy");
                }
                let _ = self.fallback.set(key, entry);
            }
        }

        debug!(cache_key = key, "Cached data");
        self.publish(key, CacheAction::Add);
    }

    async fn fetch_and_store<F, Fut>(&self, key: &str, fetch: F) -> Result<T, CacheError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, CacheError>> + Send + 'static,
    {
        match fetch().await {
            Ok(data) => {
                self.write_entry(key, data.clone());
                Ok(data)
            }
            Err(e) => {
                self.record_error(key, &e);
                Err(e)
            }
        }
    }

    fn record_error(&self, key: &str, e: &CacheError) {
        self.stats.lock().errors += 1;
        debug!(cache_key = key, error = %e, "Fetch failed");
        (self.on_error)(e);
    }

    fn publish(&self, key: &str, action: CacheAction) {
        if let Some(publisher) = &self.publisher {
            publisher.emit(OfficeEvent::CacheUpdated {
                cache_key: key.to_string(),
                action,
            });
        }
    }
}
