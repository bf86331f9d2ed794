//! Cross-crate scenarios, each wiring real components to one bus.

pub mod cache_flows;
pub mod client_flows;
pub mod runtime_flows;
