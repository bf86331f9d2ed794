//! Call client configuration with validation.

use crate::domain::error::ConfigError;
use serde::{Deserialize, Serialize};
pub use shared_bus::humantime_serde;
use std::time::Duration;

/// Main call client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallClientConfig {
    /// Admission control for outbound calls
    pub rate_limit: RateLimitConfig,
    /// Retry/backoff policy
    pub retry: RetryConfig,
    /// Timeout applied when a call does not set its own
    #[serde(with = "humantime_serde")]
    pub default_timeout: Duration,
}

impl Default for CallClientConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
            default_timeout: Duration::from_secs(30),
        }
    }
}

impl CallClientConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.max_requests_per_window == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "max_requests_per_window cannot be 0".into(),
            ));
        }

        if self.rate_limit.window.is_zero() {
            return Err(ConfigError::InvalidRateLimit("window cannot be 0".into()));
        }

        if self.rate_limit.queue_poll_interval.is_zero() {
            return Err(ConfigError::InvalidRateLimit(
                "queue_poll_interval cannot be 0".into(),
            ));
        }

        if self.retry.base_delay > self.retry.max_delay {
            return Err(ConfigError::InvalidRetry(
                "base_delay cannot exceed max_delay".into(),
            ));
        }

        if self.default_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "default timeout cannot be 0".into(),
            ));
        }

        Ok(())
    }
}

/// Fixed-window rate limiting configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    pub enabled: bool,
    /// Calls admitted per window
    pub max_requests_per_window: u32,
    /// Window length
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    /// How often the queue processor re-checks the window while waiting
    #[serde(with = "humantime_serde")]
    pub queue_poll_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests_per_window: 10,
            window: Duration::from_secs(1),
            queue_poll_interval: Duration::from_millis(100),
        }
    }
}

/// Exponential backoff policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries used when a call does not set its own
    pub max_retries: u32,
    /// Delay before the first retry
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
    /// Upper bound for any single delay
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based): `min(base * 2^(attempt-1), max)`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}
