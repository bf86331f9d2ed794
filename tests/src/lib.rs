//! # Law-Office Runtime Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support.rs        # Scripted invoker and bus recorders
//! └── integration/      # Cross-crate scenarios
//!     ├── client_flows.rs
//!     ├── cache_flows.rs
//!     └── runtime_flows.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p lo-tests
//! cargo test -p lo-tests integration::cache_flows
//! cargo bench -p lo-tests
//! ```

pub mod integration;
pub mod support;
