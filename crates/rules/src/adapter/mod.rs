//! Query adapters: named resolvers for `dynamic` rule content.
//!
//! Instead of storing one rule row per fact combination, a rule names an
//! adapter and a method, and the registry dispatches to it at match time.

mod func;
mod table;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use augur_core::{ContentSource, FactContext};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::warn;

pub use func::FnAdapter;
pub use table::TableAdapter;

use crate::error::AdapterError;
use crate::ir::content::RuleContent;

/// A resolver for dynamic content.
#[async_trait]
pub trait QueryAdapter: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Produce the content for `method` given the subject's facts.
    async fn resolve(&self, method: &str, facts: &FactContext) -> Result<Value, AdapterError>;
}

/// Thread-safe registry of query adapters, keyed by name.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: RwLock<HashMap<String, Arc<dyn QueryAdapter>>>,
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("adapters", &self.names())
            .finish()
    }
}

impl AdapterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adapter` under `name`, returning the adapter it replaced.
    pub fn register(
        &self,
        name: impl Into<String>,
        adapter: Arc<dyn QueryAdapter>,
    ) -> Option<Arc<dyn QueryAdapter>> {
        self.adapters.write().insert(name.into(), adapter)
    }

    /// Register a closure as an adapter.
    pub fn register_fn<F>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(&str, &FactContext) -> Result<Value, AdapterError> + Send + Sync + 'static,
    {
        let name = name.into();
        let adapter = Arc::new(FnAdapter::new(name.clone(), f));
        self.register(name, adapter);
    }

    /// Remove an adapter. Returns `true` if one was registered.
    pub fn unregister(&self, name: &str) -> bool {
        self.adapters.write().remove(name).is_some()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.adapters.read().contains_key(name)
    }

    /// Registered adapter names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.adapters.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Dispatch to the adapter registered as `name`.
    pub async fn resolve(
        &self,
        name: &str,
        method: &str,
        facts: &FactContext,
    ) -> Result<Value, AdapterError> {
        let adapter = self
            .adapters
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| AdapterError::UnknownAdapter(name.to_owned()))?;
        adapter.resolve(method, facts).await
    }

    /// Resolve a rule's content.
    ///
    /// Static content is returned as is. Dynamic content is resolved through
    /// its adapter; any adapter error falls back to `default_content`, or
    /// `null` when the rule declares none.
    pub async fn resolve_content(
        &self,
        content: &RuleContent,
        facts: &FactContext,
    ) -> (Value, ContentSource) {
        match content {
            RuleContent::Static(value) => (value.clone(), ContentSource::Static),
            RuleContent::Dynamic {
                adapter,
                method,
                default_content,
            } => match self.resolve(adapter, method, facts).await {
                Ok(value) => (value, ContentSource::Adapter),
                Err(e) => {
                    warn!(adapter = %adapter, method = %method, error = %e, "falling back to default content");
                    (
                        default_content.clone().unwrap_or(Value::Null),
                        ContentSource::Default,
                    )
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dynamic(adapter: &str, method: &str) -> RuleContent {
        RuleContent::Dynamic {
            adapter: adapter.into(),
            method: method.into(),
            default_content: Some(json!({"text": "default"})),
        }
    }

    fn echo_registry() -> AdapterRegistry {
        let registry = AdapterRegistry::new();
        registry.register_fn("echo", |method, facts| match method {
            "pillar" => Ok(facts.get("day_pillar").cloned().unwrap_or(Value::Null)),
            other => Err(AdapterError::UnknownMethod {
                adapter: "echo".into(),
                method: other.into(),
            }),
        });
        registry
    }

    #[tokio::test]
    async fn resolves_registered_adapter() {
        let registry = echo_registry();
        let facts = FactContext::new().with("day_pillar", "甲子");
        let value = registry.resolve("echo", "pillar", &facts).await.unwrap();
        assert_eq!(value, json!("甲子"));
    }

    #[tokio::test]
    async fn unknown_adapter_is_an_error() {
        let registry = AdapterRegistry::new();
        let err = registry
            .resolve("ghost", "any", &FactContext::new())
            .await
            .unwrap_err();
        assert_eq!(err, AdapterError::UnknownAdapter("ghost".into()));
    }

    #[tokio::test]
    async fn resolve_content_falls_back() {
        let registry = echo_registry();
        let facts = FactContext::new().with("day_pillar", "甲子");

        let (value, source) = registry.resolve_content(&dynamic("echo", "pillar"), &facts).await;
        assert_eq!((value, source), (json!("甲子"), ContentSource::Adapter));

        let (value, source) = registry.resolve_content(&dynamic("echo", "nope"), &facts).await;
        assert_eq!((value, source), (json!({"text": "default"}), ContentSource::Default));

        let (value, source) = registry.resolve_content(&dynamic("ghost", "x"), &facts).await;
        assert_eq!(source, ContentSource::Default);
        assert_eq!(value, json!({"text": "default"}));

        let no_default = RuleContent::Dynamic {
            adapter: "ghost".into(),
            method: "x".into(),
            default_content: None,
        };
        let (value, _) = registry.resolve_content(&no_default, &facts).await;
        assert!(value.is_null());
    }

    #[tokio::test]
    async fn static_content_passes_through() {
        let registry = AdapterRegistry::new();
        let (value, source) = registry
            .resolve_content(&RuleContent::Static(json!({"text": "hi"})), &FactContext::new())
            .await;
        assert_eq!(value, json!({"text": "hi"}));
        assert_eq!(source, ContentSource::Static);
    }

    #[test]
    fn register_and_unregister() {
        let registry = echo_registry();
        assert!(registry.contains("echo"));
        assert_eq!(registry.names(), ["echo"]);
        assert!(registry.unregister("echo"));
        assert!(!registry.unregister("echo"));
        assert!(registry.names().is_empty());
    }
}
