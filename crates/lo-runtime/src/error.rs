//! Runtime errors.

use thiserror::Error;

/// Failures while loading configuration or wiring components.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv { var: String, value: String },

    #[error("Call client config: {0}")]
    Client(#[from] lo_01_call_client::ConfigError),

    #[error("Data cache config: {0}")]
    Cache(#[from] lo_02_data_cache::ConfigError),

    #[error(transparent)]
    Telemetry(#[from] lo_telemetry::TelemetryError),

    #[error("A global runtime is already installed")]
    GlobalAlreadySet,
}
