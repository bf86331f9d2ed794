//! Outbound ports (driven side).

use crate::domain::error::RemoteError;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

/// Executes one named remote operation.
///
/// Implementations wrap whatever request/response mechanism the host uses
/// (hosted functions, HTTP, an RPC channel). The client never inspects the
/// payload beyond computing its signature.
#[async_trait]
pub trait OperationInvoker: Send + Sync {
    async fn invoke(&self, operation: &str, payload: &Value) -> Result<Value, RemoteError>;
}

/// Adapter turning a closure into an [`OperationInvoker`].
pub struct FnInvoker<F> {
    f: F,
}

impl<F> FnInvoker<F>
where
    F: Fn(String, Value) -> BoxFuture<'static, Result<Value, RemoteError>> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> OperationInvoker for FnInvoker<F>
where
    F: Fn(String, Value) -> BoxFuture<'static, Result<Value, RemoteError>> + Send + Sync,
{
    async fn invoke(&self, operation: &str, payload: &Value) -> Result<Value, RemoteError> {
        (self.f)(operation.to_string(), payload.clone()).await
    }
}

/// Scripted invoker for testing.
#[cfg(test)]
pub struct MockInvoker {
    script: parking_lot::Mutex<std::collections::VecDeque<Result<Value, RemoteError>>>,
    fallback: Result<Value, RemoteError>,
    delay: std::time::Duration,
    calls: std::sync::atomic::AtomicU32,
    operations: parking_lot::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockInvoker {
    /// Always answers with `value`.
    pub fn ok(value: Value) -> Self {
        Self {
            script: parking_lot::Mutex::new(std::collections::VecDeque::new()),
            fallback: Ok(value),
            delay: std::time::Duration::ZERO,
            calls: std::sync::atomic::AtomicU32::new(0),
            operations: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Always fails with `error`.
    pub fn failing(error: RemoteError) -> Self {
        let mut mock = Self::ok(Value::Null);
        mock.fallback = Err(error);
        mock
    }

    /// Answer with `responses` in order, then fall back.
    pub fn with_script(mut self, responses: Vec<Result<Value, RemoteError>>) -> Self {
        self.script = parking_lot::Mutex::new(responses.into());
        self
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn operations(&self) -> Vec<String> {
        self.operations.lock().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl OperationInvoker for MockInvoker {
    async fn invoke(&self, operation: &str, _payload: &Value) -> Result<Value, RemoteError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.operations.lock().push(operation.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let scripted = self.script.lock().pop_front();
        scripted.unwrap_or_else(|| self.fallback.clone())
    }
}
