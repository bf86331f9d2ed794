//! Ports layer: the seam where the remote transport plugs in.

pub mod outbound;

pub use outbound::{FnInvoker, OperationInvoker};
