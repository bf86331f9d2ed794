//! Composition of bus, call client and cache.

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use lo_01_call_client::{CallClient, CallOptions, CallOutcome, OperationInvoker};
use lo_02_data_cache::{CacheError, GetOptions, KeyValueStore, SwrCache};
use serde_json::Value;
use shared_bus::{EventBus, EventPublisher};
use std::sync::{Arc, OnceLock};
use tracing::info;

static GLOBAL: OnceLock<OfficeRuntime> = OnceLock::new();

/// The three office services sharing one event bus.
#[derive(Clone)]
pub struct OfficeRuntime {
    config: RuntimeConfig,
    bus: Arc<EventBus>,
    client: CallClient,
    cache: SwrCache<Value>,
}

impl OfficeRuntime {
    /// Build with a fresh bus and no persistent backend.
    ///
    /// `storage = "persistent"` without a backend falls back to memory.
    pub fn new(
        config: RuntimeConfig,
        invoker: Arc<dyn OperationInvoker>,
    ) -> Result<Self, RuntimeError> {
        let bus = Arc::new(EventBus::with_config(config.bus.clone()));
        Self::assemble(config, invoker, bus, None)
    }

    /// Build around an existing bus and an optional key-value backend.
    pub fn with_parts(
        config: RuntimeConfig,
        invoker: Arc<dyn OperationInvoker>,
        bus: Arc<EventBus>,
        key_value_store: Option<Arc<dyn KeyValueStore>>,
    ) -> Result<Self, RuntimeError> {
        Self::assemble(config, invoker, bus, key_value_store)
    }

    fn assemble(
        config: RuntimeConfig,
        invoker: Arc<dyn OperationInvoker>,
        bus: Arc<EventBus>,
        key_value_store: Option<Arc<dyn KeyValueStore>>,
    ) -> Result<Self, RuntimeError> {
        config.validate()?;

        let publisher: Arc<dyn EventPublisher> = bus.clone();
        let client = CallClient::new(config.client.clone(), invoker, publisher.clone())?;

        let mut builder = SwrCache::builder(config.cache.clone()).event_publisher(publisher);
        if let Some(kv) = key_value_store {
            builder = builder.key_value_store(kv);
        }
        let cache = builder.build()?;

        info!(
            storage = ?cache.storage_kind(),
            history_capacity = config.bus.history_capacity,
            rate_limit = config.client.rate_limit.max_requests_per_window,
            "Office runtime assembled"
        );

        Ok(Self {
            config,
            bus,
            client,
            cache,
        })
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[must_use]
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    #[must_use]
    pub fn client(&self) -> &CallClient {
        &self.client
    }

    #[must_use]
    pub fn cache(&self) -> &SwrCache<Value> {
        &self.cache
    }

    /// Stale-while-revalidate lookup of `key`, fetched through the call client.
    ///
    /// A failed call surfaces as [`CacheError::Fetch`] carrying the error code.
    pub async fn call_cached(
        &self,
        key: &str,
        operation: &str,
        payload: Value,
        options: CallOptions,
    ) -> Result<Value, CacheError> {
        self.call_cached_with(key, operation, payload, options, GetOptions::default())
            .await
    }

    /// [`call_cached`](Self::call_cached) with explicit cache options.
    pub async fn call_cached_with(
        &self,
        key: &str,
        operation: &str,
        payload: Value,
        options: CallOptions,
        get_options: GetOptions,
    ) -> Result<Value, CacheError> {
        let client = self.client.clone();
        let operation = operation.to_string();

        self.cache
            .get(
                key,
                move || async move {
                    let response = client.call(&operation, payload, options).await;
                    match response.outcome {
                        CallOutcome::Success(data) => Ok(data),
                        CallOutcome::Failure { error, code } => {
                            Err(CacheError::fetch(format!("[{code}] {error}")))
                        }
                    }
                },
                get_options,
            )
            .await
    }

    /// Make `self` the process-wide runtime. Only the first install wins.
    pub fn install_global(self) -> Result<&'static OfficeRuntime, RuntimeError> {
        GLOBAL.set(self).map_err(|_| RuntimeError::GlobalAlreadySet)?;
        GLOBAL.get().ok_or(RuntimeError::GlobalAlreadySet)
    }

    /// The installed process-wide runtime, if any.
    #[must_use]
    pub fn global() -> Option<&'static OfficeRuntime> {
        GLOBAL.get()
    }
}

impl std::fmt::Debug for OfficeRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfficeRuntime")
            .field("config", &self.config)
            .field("storage", &self.cache.storage_kind())
            .finish_non_exhaustive()
    }
}
