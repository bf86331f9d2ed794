//! # Office Telemetry
//!
//! One place to install the `tracing` subscriber for every binary and test
//! harness built on the office runtime.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lo_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LO_LOG_LEVEL` / `RUST_LOG` | `info` | Filter directive |
//! | `LO_JSON_LOGS` | `false` | JSON output |
//! | `LO_CONSOLE_OUTPUT` | `true` | Write to stdout |
//! | `LO_SERVICE_NAME` | `law-office` | Service name |

mod config;
mod logging;

pub use config::TelemetryConfig;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialised,

    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
}

/// Install the global subscriber described by `config`.
///
/// A second call in the same process returns
/// [`TelemetryError::AlreadyInitialised`].
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    logging::init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        level = %config.log_level,
        json = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Held for the lifetime of the application.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
