//! Aggregated runtime configuration.
//!
//! Loaded from TOML, then overridden from `LO_*` environment variables:
//!
//! ```toml
//! [telemetry]
//! log_level = "debug"
//!
//! [bus]
//! history_capacity = 200
//!
//! [client.rate_limit]
//! max_requests_per_window = 5
//! window = "1s"
//!
//! [cache]
//! max_age = "5m"
//! storage = "persistent"
//! ```

use crate::error::RuntimeError;
use lo_01_call_client::domain::config::humantime_serde::parse_duration;
use lo_01_call_client::CallClientConfig;
use lo_02_data_cache::{DataCacheConfig, StorageKind};
use lo_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use shared_bus::EventBusConfig;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Everything needed to build an [`OfficeRuntime`](crate::OfficeRuntime).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub telemetry: TelemetryConfig,
    pub bus: EventBusConfig,
    pub client: CallClientConfig,
    pub cache: DataCacheConfig,
}

impl RuntimeConfig {
    /// Read and parse a TOML file. Environment overrides are not applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RuntimeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| RuntimeError::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse TOML text.
    pub fn parse(content: &str) -> Result<Self, RuntimeError> {
        toml::from_str(content).map_err(|e| RuntimeError::Parse(e.to_string()))
    }

    /// Apply `LO_*` overrides from the process environment.
    pub fn with_env_overrides(mut self) -> Result<Self, RuntimeError> {
        self.telemetry = self.telemetry.with_env_overrides();
        self.with_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary lookup.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `LO_HISTORY_CAPACITY` | `bus.history_capacity` |
    /// | `LO_RATE_LIMIT_ENABLED` | `client.rate_limit.enabled` |
    /// | `LO_RATE_LIMIT` | `client.rate_limit.max_requests_per_window` |
    /// | `LO_RATE_WINDOW` | `client.rate_limit.window` |
    /// | `LO_MAX_RETRIES` | `client.retry.max_retries` |
    /// | `LO_DEFAULT_TIMEOUT` | `client.default_timeout` |
    /// | `LO_CACHE_MAX_AGE` | `cache.max_age` |
    /// | `LO_CACHE_STALE_AGE` | `cache.stale_age` |
    /// | `LO_CACHE_STORAGE` | `cache.storage` (`memory` or `persistent`) |
    /// | `LO_CACHE_NAMESPACE` | `cache.namespace` |
    ///
    /// Telemetry variables are handled by [`TelemetryConfig::with_env_overrides`]
    /// and only read from the real process environment.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, RuntimeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(&lookup);

        if let Some(v) = env.parsed::<usize>("LO_HISTORY_CAPACITY")? {
            self.bus.history_capacity = v;
        }
        if let Some(v) = env.flag("LO_RATE_LIMIT_ENABLED")? {
            self.client.rate_limit.enabled = v;
        }
        if let Some(v) = env.parsed::<u32>("LO_RATE_LIMIT")? {
            self.client.rate_limit.max_requests_per_window = v;
        }
        if let Some(v) = env.duration("LO_RATE_WINDOW")? {
            self.client.rate_limit.window = v;
        }
        if let Some(v) = env.parsed::<u32>("LO_MAX_RETRIES")? {
            self.client.retry.max_retries = v;
        }
        if let Some(v) = env.duration("LO_DEFAULT_TIMEOUT")? {
            self.client.default_timeout = v;
        }
        if let Some(v) = env.duration("LO_CACHE_MAX_AGE")? {
            self.cache.max_age = v;
        }
        if let Some(v) = env.duration("LO_CACHE_STALE_AGE")? {
            self.cache.stale_age = v;
        }
        if let Some(raw) = lookup("LO_CACHE_STORAGE") {
            self.cache.storage = match raw.trim().to_ascii_lowercase().as_str() {
                "memory" => StorageKind::Memory,
                "persistent" => StorageKind::Persistent,
                _ => return Err(invalid("LO_CACHE_STORAGE", raw)),
            };
        }
        if let Some(v) = lookup("LO_CACHE_NAMESPACE") {
            self.cache.namespace = v;
        }

        Ok(self)
    }

    /// Validate every component config.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        self.client.validate()?;
        self.cache.validate()?;
        Ok(())
    }
}

struct Lookup<'a, F>(&'a F);

impl<F> Lookup<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn parsed<T: FromStr>(&self, var: &str) -> Result<Option<T>, RuntimeError> {
        match (self.0)(var) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| invalid(var, raw)),
            None => Ok(None),
        }
    }

    fn duration(&self, var: &str) -> Result<Option<Duration>, RuntimeError> {
        match (self.0)(var) {
            Some(raw) => parse_duration(&raw).map(Some).map_err(|_| invalid(var, raw)),
            None => Ok(None),
        }
    }

    fn flag(&self, var: &str) -> Result<Option<bool>, RuntimeError> {
        match (self.0)(var) {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(Some(true)),
                "0" | "false" | "no" | "off" => Ok(Some(false)),
                _ => Err(invalid(var, raw)),
            },
            None => Ok(None),
        }
    }
}

fn invalid(var: &str, value: String) -> RuntimeError {
    RuntimeError::InvalidEnv {
        var: var.to_string(),
        value,
    }
}
