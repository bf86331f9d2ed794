//! # Office Runtime
//!
//! Wires the event bus, call client and data cache together so that every
//! cache update and every remote settlement lands on the same bus.
//!
//! ```rust,ignore
//! let config = RuntimeConfig::load("office.toml")?.with_env_overrides()?;
//! let _telemetry = lo_runtime::init_telemetry(&config)?;
//! let runtime = OfficeRuntime::new(config, invoker)?;
//!
//! let clients = runtime
//!     .call_cached("clients", "getClients", json!({}), CallOptions::default())
//!     .await?;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod error;
pub mod runtime;

pub use config::RuntimeConfig;
pub use error::RuntimeError;
pub use runtime::OfficeRuntime;

/// Install the tracing subscriber described by `config.telemetry`.
pub fn init_telemetry(
    config: &RuntimeConfig,
) -> Result<lo_telemetry::TelemetryGuard, RuntimeError> {
    Ok(lo_telemetry::init_telemetry(config.telemetry.clone())?)
}
