use std::sync::Arc;

use tracing::{error, info};

use augur_cache::{CacheConfig, CacheManager, CacheMetrics, SharedCache};
use augur_rules::{AdapterRegistry, QueryAdapter, RankingWeights, RuleIndex};
use augur_store::RuleStore;

use crate::engine::Engine;
use crate::error::EngineError;
use crate::metrics::EngineMetrics;

/// Fluent builder for constructing an [`Engine`].
///
/// Building performs the cold-start load: the engine refuses to start when
/// the rule store cannot be read.
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Arc<dyn RuleStore>>,
    adapters: Vec<(String, Arc<dyn QueryAdapter>)>,
    cache_config: CacheConfig,
    shared_cache: Option<Arc<dyn SharedCache>>,
    weights: RankingWeights,
    metrics: Option<Arc<EngineMetrics>>,
    cache_metrics: Option<Arc<CacheMetrics>>,
}

impl EngineBuilder {
    /// Create a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rule store (required).
    #[must_use]
    pub fn store(mut self, store: Arc<dyn RuleStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Register a query adapter under `name`.
    #[must_use]
    pub fn adapter(mut self, name: impl Into<String>, adapter: Arc<dyn QueryAdapter>) -> Self {
        self.adapters.push((name.into(), adapter));
        self
    }

    #[must_use]
    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Add a shared (L2) cache tier.
    #[must_use]
    pub fn shared_cache(mut self, cache: Arc<dyn SharedCache>) -> Self {
        self.shared_cache = Some(cache);
        self
    }

    /// Set the weights used by ranked matches.
    #[must_use]
    pub fn ranking_weights(mut self, weights: RankingWeights) -> Self {
        self.weights = weights;
        self
    }

    #[must_use]
    pub fn metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    #[must_use]
    pub fn cache_metrics(mut self, metrics: Arc<CacheMetrics>) -> Self {
        self.cache_metrics = Some(metrics);
        self
    }

    /// Load the initial rule set and build the engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if no store was set, and
    /// [`EngineError::ColdStart`] if the initial load fails.
    pub async fn build(self) -> Result<Engine, EngineError> {
        let store = self
            .store
            .ok_or_else(|| EngineError::Configuration("rule store is required".into()))?;

        let snapshot = store.load_enabled_rules().await.map_err(|e| {
            error!(error = %e, "initial rule load failed");
            EngineError::ColdStart(e.to_string())
        })?;
        let index = Arc::new(RuleIndex::build(snapshot.version.rule_version, snapshot.rules));
        info!(
            version = index.version(),
            rules = index.len(),
            malformed = index.malformed().len(),
            "initial rule index loaded"
        );

        let cache_metrics = self.cache_metrics.unwrap_or_default();
        let cache = match self.shared_cache {
            Some(l2) => CacheManager::with_shared(self.cache_config, l2, cache_metrics),
            None => CacheManager::new(self.cache_config, cache_metrics),
        };

        let adapters = Arc::new(AdapterRegistry::new());
        for (name, adapter) in self.adapters {
            adapters.register(name, adapter);
        }

        Ok(Engine::from_parts(
            store,
            index,
            cache,
            adapters,
            self.weights,
            self.metrics.unwrap_or_default(),
        ))
    }
}
