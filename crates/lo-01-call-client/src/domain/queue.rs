//! Overflow queue for calls that arrived while the rate limit was exhausted.
//!
//! Ordered by priority descending, FIFO within equal priority.

use crate::domain::response::{CallOptions, CallResponse};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// A call waiting for admission.
#[derive(Debug)]
pub struct QueuedRequest {
    pub operation: String,
    pub payload: serde_json::Value,
    pub options: CallOptions,
    /// Settles the caller's future.
    pub responder: oneshot::Sender<CallResponse>,
    pub priority: i32,
    pub enqueued_at: Instant,
    seq: u64,
}

impl PartialEq for QueuedRequest {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueuedRequest {}

impl PartialOrd for QueuedRequest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedRequest {
    // Max-heap: higher priority first, then lower sequence (earlier arrival).
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Priority-then-FIFO queue.
#[derive(Debug, Default)]
pub struct RequestQueue {
    heap: BinaryHeap<QueuedRequest>,
    next_seq: u64,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        operation: String,
        payload: serde_json::Value,
        options: CallOptions,
        responder: oneshot::Sender<CallResponse>,
    ) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(QueuedRequest {
            operation,
            payload,
            priority: options.priority,
            options,
            responder,
            enqueued_at: Instant::now(),
            seq,
        });
    }

    pub fn pop(&mut self) -> Option<QueuedRequest> {
        self.heap.pop()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
