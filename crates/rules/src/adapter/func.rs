use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use augur_core::FactContext;
use serde_json::Value;

use super::QueryAdapter;
use crate::error::AdapterError;

type ResolveFn = dyn Fn(&str, &FactContext) -> Result<Value, AdapterError> + Send + Sync;

/// An adapter backed by a synchronous closure.
///
/// Counts calls so tests can observe how often content was resolved.
pub struct FnAdapter {
    name: String,
    f: Arc<ResolveFn>,
    calls: AtomicUsize,
}

impl FnAdapter {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&str, &FactContext) -> Result<Value, AdapterError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Arc::new(f),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of times [`resolve`](QueryAdapter::resolve) was called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl QueryAdapter for FnAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self, method: &str, facts: &FactContext) -> Result<Value, AdapterError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        (self.f)(method, facts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn counts_calls() {
        let adapter = FnAdapter::new("const", |_, _| Ok(json!(1)));
        assert_eq!(adapter.name(), "const");
        adapter.resolve("m", &FactContext::new()).await.unwrap();
        adapter.resolve("m", &FactContext::new()).await.unwrap();
        assert_eq!(adapter.call_count(), 2);
    }
}
