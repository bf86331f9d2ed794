//! Running call statistics.

use serde::Serialize;
use std::time::Duration;

/// Snapshot returned by [`crate::CallClient::stats`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallClientStats {
    /// Every `call()` invocation, including cache hits and dedup joins.
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub cached_calls: u64,
    /// Retry attempts performed across all executions.
    pub retried_calls: u64,
    /// Mean settled execution time in milliseconds.
    pub average_response_time_ms: f64,
    /// Calls that found the window exhausted.
    pub rate_limit_hits: u64,
    /// Current queue depth.
    pub queued_requests: usize,
}

#[derive(Debug, Default)]
pub(crate) struct StatsState {
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub cached_calls: u64,
    pub retried_calls: u64,
    pub rate_limit_hits: u64,
    settled: u64,
    average_response_time_ms: f64,
}

impl StatsState {
    pub fn record_settled(&mut self, success: bool, duration: Duration, retries: u32) {
        if success {
            self.successful_calls += 1;
        } else {
            self.failed_calls += 1;
        }
        self.retried_calls += u64::from(retries);

        self.settled += 1;
        let n = self.settled as f64;
        let ms = duration.as_secs_f64() * 1000.0;
        self.average_response_time_ms = (self.average_response_time_ms * (n - 1.0) + ms) / n;
    }

    pub fn snapshot(&self, queued_requests: usize) -> CallClientStats {
        CallClientStats {
            total_calls: self.total_calls,
            successful_calls: self.successful_calls,
            failed_calls: self.failed_calls,
            cached_calls: self.cached_calls,
            retried_calls: self.retried_calls,
            average_response_time_ms: self.average_response_time_ms,
            rate_limit_hits: self.rate_limit_hits,
            queued_requests,
        }
    }
}
