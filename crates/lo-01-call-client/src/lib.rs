//! # Call Client - Resilient Remote Calls
//!
//! Every remote operation the office client performs funnels through
//! [`CallClient::call`].
//!
//! ## Guarantees
//!
//! - At most one execution per signature `(operation, payload)` is in flight;
//!   concurrent identical calls observe the same settlement
//! - At most `max_requests_per_window` executions start per window; the rest
//!   wait in a priority-then-FIFO queue
//! - Each attempt is raced against a timeout; transient failures are retried
//!   with exponential backoff, terminal ones stop immediately
//! - Failures are values ([`CallOutcome::Failure`]), never panics
//! - Every settlement is announced on the event bus as `system:data-loaded`
//!   or `system:error`
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │ service::CallClient                        │
//! │   cache → dedup → limiter/queue → execute  │
//! └──────────────┬───────────────────┬─────────┘
//!                │                   │
//!      ports::OperationInvoker   shared_bus::EventPublisher
//! ```

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    signature, CallClientConfig, CallClientStats, CallOptions, CallOutcome, CallPhase,
    CallResponse, ConfigError, ErrorCode, ErrorHook, RateLimitConfig, RemoteError, RetryConfig,
};
pub use ports::{FnInvoker, OperationInvoker};
pub use service::CallClient;
