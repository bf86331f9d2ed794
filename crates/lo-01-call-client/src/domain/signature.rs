//! Deterministic call signatures.
//!
//! The same `(operation, payload)` pair always yields the same string, so it
//! can key both the in-flight map and the response cache. Object keys are
//! emitted in sorted order because `serde_json::Map` is a `BTreeMap`.

use serde_json::Value;

/// Build the signature for one logical call.
#[must_use]
pub fn signature(operation: &str, payload: &Value) -> String {
    format!("{operation}:{payload}")
}
