//! Per-call options, the settled response, and the call lifecycle.

use crate::domain::error::{ErrorCode, RemoteError};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Hook invoked with every failed attempt that is about to be retried.
pub type ErrorHook = Arc<dyn Fn(&RemoteError) + Send + Sync>;

/// Options for a single [`crate::CallClient::call`].
#[derive(Clone, Default)]
pub struct CallOptions {
    /// Retries after the first attempt; `None` uses the client default.
    pub retries: Option<u32>,
    /// Response cache lifetime; zero disables caching for this call.
    pub cache_ttl: Duration,
    /// Per-attempt timeout; `None` uses the client default.
    pub timeout: Option<Duration>,
    /// Queue priority when the rate limit is exhausted. Higher runs first.
    pub priority: i32,
    /// Execute immediately even when the window is exhausted.
    pub skip_rate_limit: bool,
    pub on_error: Option<ErrorHook>,
}

impl CallOptions {
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn skip_rate_limit(mut self) -> Self {
        self.skip_rate_limit = true;
        self
    }

    #[must_use]
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RemoteError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub(crate) fn caching_enabled(&self) -> bool {
        !self.cache_ttl.is_zero()
    }
}

impl fmt::Debug for CallOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallOptions")
            .field("retries", &self.retries)
            .field("cache_ttl", &self.cache_ttl)
            .field("timeout", &self.timeout)
            .field("priority", &self.priority)
            .field("skip_rate_limit", &self.skip_rate_limit)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// How a call settled.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Success(Value),
    Failure { error: String, code: ErrorCode },
}

/// Result handed to every caller of one logical call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallResponse {
    pub outcome: CallOutcome,
    /// Wall time from the start of execution to settlement.
    pub duration: Duration,
    /// Retries spent before settlement.
    pub retries: u32,
    /// Served from the response cache without touching the invoker.
    pub cached: bool,
}

impl CallResponse {
    pub(crate) fn success(data: Value, duration: Duration, retries: u32) -> Self {
        Self {
            outcome: CallOutcome::Success(data),
            duration,
            retries,
            cached: false,
        }
    }

    pub(crate) fn failure(error: &RemoteError, duration: Duration, retries: u32) -> Self {
        Self {
            outcome: CallOutcome::Failure {
                error: error.message.clone(),
                code: error.code,
            },
            duration,
            retries,
            cached: false,
        }
    }

    pub(crate) fn from_cache(data: Value) -> Self {
        Self {
            outcome: CallOutcome::Success(data),
            duration: Duration::ZERO,
            retries: 0,
            cached: true,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, CallOutcome::Success(_))
    }

    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        match &self.outcome {
            CallOutcome::Success(data) => Some(data),
            CallOutcome::Failure { .. } => None,
        }
    }

    #[must_use]
    pub fn into_data(self) -> Option<Value> {
        match self.outcome {
            CallOutcome::Success(data) => Some(data),
            CallOutcome::Failure { .. } => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            CallOutcome::Success(_) => None,
            CallOutcome::Failure { error, .. } => Some(error),
        }
    }

    #[must_use]
    pub fn error_code(&self) -> Option<ErrorCode> {
        match &self.outcome {
            CallOutcome::Success(_) => None,
            CallOutcome::Failure { code, .. } => Some(*code),
        }
    }
}

/// Lifecycle of one execution.
///
/// ```text
/// Pending ──► Queued ──► Executing ◄──► Retrying
///    │                       │
///    └──────────────►────────┴──► Settled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Pending,
    Queued,
    Executing { attempt: u32 },
    Retrying { attempt: u32, delay: Duration },
    Settled { success: bool },
}

impl CallPhase {
    /// Whether moving from `self` to `next` is a legal step.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use CallPhase::*;
        match (self, next) {
            (Pending, Queued | Executing { attempt: 0 } | Settled { .. }) => true,
            (Queued, Executing { attempt: 0 }) => true,
            (Executing { attempt: a }, Retrying { attempt: b, .. }) => b == a + 1,
            (Executing { .. }, Settled { .. }) => true,
            (Retrying { attempt: a, .. }, Executing { attempt: b }) => a == b,
            _ => false,
        }
    }

    #[must_use]
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Settled { .. })
    }
}
