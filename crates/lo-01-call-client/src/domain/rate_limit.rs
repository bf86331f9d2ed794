//! Fixed-window admission control.
//!
//! Capacity `N` per window of length `W`. When a check happens at or after
//! the window's reset time, the count drops to zero and the next window
//! starts at that moment. Bursts of up to `2N` across a window boundary are
//! possible and expected.

use crate::domain::config::RateLimitConfig;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Token counter for the current window.
#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: u32,
    reset_time: Instant,
}

/// Fixed-window rate limiter shared by every call of one client.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    bucket: Mutex<Bucket>,
    capacity: u32,
    window: Duration,
    enabled: bool,
}

impl FixedWindowLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            bucket: Mutex::new(Bucket {
                count: 0,
                reset_time: Instant::now() + config.window,
            }),
            capacity: config.max_requests_per_window,
            window: config.window,
            enabled: config.enabled,
        }
    }

    /// Consume one slot if the current window has capacity.
    pub fn try_acquire(&self) -> bool {
        if !self.enabled {
            return true;
        }

        let now = Instant::now();
        let mut bucket = self.bucket.lock();

        if now >= bucket.reset_time {
            debug!(previous = bucket.count, "Rate limit window reset");
            bucket.count = 0;
            bucket.reset_time = now + self.window;
        }

        if bucket.count < self.capacity {
            bucket.count += 1;
            true
        } else {
            false
        }
    }

    /// Slots already used in the current window.
    pub fn used(&self) -> u32 {
        self.bucket.lock().count
    }

    /// Time left until the current window closes.
    pub fn time_until_reset(&self) -> Duration {
        self.bucket
            .lock()
            .reset_time
            .saturating_duration_since(Instant::now())
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}
