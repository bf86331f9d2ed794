//! Domain layer: configuration, error taxonomy, admission control, and the
//! bookkeeping structures behind the call client.

pub mod config;
pub mod error;
pub mod queue;
pub mod rate_limit;
pub mod response;
pub mod response_cache;
pub mod signature;
pub mod stats;

pub use config::{CallClientConfig, RateLimitConfig, RetryConfig};
pub use error::{ConfigError, ErrorCode, RemoteError};
pub use queue::{QueuedRequest, RequestQueue};
pub use rate_limit::FixedWindowLimiter;
pub use response::{CallOptions, CallOutcome, CallPhase, CallResponse, ErrorHook};
pub use response_cache::ResponseCache;
pub use signature::signature;
pub use stats::CallClientStats;
