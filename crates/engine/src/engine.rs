use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use augur_cache::{CacheError, CacheKey, CacheManager, CacheMetrics};
use augur_core::{
    ContentSource, FactContext, MatchSet, MatchedRule, RuleRecord, RuleType, fact_fingerprint,
    normalize_rule_types,
};
use augur_rules::{
    AdapterRegistry, QueryAdapter, RankingWeights, RuleIndex, SelectOptions, Selected, select,
};
use augur_store::RuleStore;

use crate::builder::EngineBuilder;
use crate::error::EngineError;
use crate::metrics::EngineMetrics;
use crate::tracker::TrackerStatus;
use crate::types::{EngineStatus, MatchRequest, MatchResult};

pub(crate) struct EngineInner {
    pub store: Arc<dyn RuleStore>,
    pub index: ArcSwap<RuleIndex>,
    pub cache: CacheManager<MatchSet>,
    pub adapters: Arc<AdapterRegistry>,
    pub weights: RankingWeights,
    pub metrics: Arc<EngineMetrics>,
    pub reload_lock: tokio::sync::Mutex<()>,
    pub status: Mutex<TrackerStatus>,
    pub version_tx: watch::Sender<u64>,
}

/// The rule matching engine.
///
/// Each match captures one index generation for its whole computation, so a
/// concurrent reload never produces a result mixing two rule sets. Cloning
/// is cheap and all clones share state.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("version", &self.version())
            .field("rules", &self.index().len())
            .field("cache", &self.inner.cache)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Start building an engine.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub(crate) fn from_parts(
        store: Arc<dyn RuleStore>,
        index: Arc<RuleIndex>,
        cache: CacheManager<MatchSet>,
        adapters: Arc<AdapterRegistry>,
        weights: RankingWeights,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        let (version_tx, _) = watch::channel(index.version());
        metrics.set_malformed_rules(u64::try_from(index.malformed().len()).unwrap_or(u64::MAX));
        Self {
            inner: Arc::new(EngineInner {
                store,
                index: ArcSwap::new(index),
                cache,
                adapters,
                weights,
                metrics,
                reload_lock: tokio::sync::Mutex::new(()),
                status: Mutex::new(TrackerStatus {
                    last_reload_at: Some(chrono::Utc::now()),
                    ..TrackerStatus::default()
                }),
                version_tx,
            }),
        }
    }

    pub(crate) fn inner(&self) -> &EngineInner {
        &self.inner
    }

    /// Match facts against all rules, or only those of `rule_types`.
    pub async fn match_facts(
        &self,
        facts: &FactContext,
        rule_types: Option<Vec<RuleType>>,
    ) -> Result<MatchResult, EngineError> {
        self.match_with(facts, &MatchRequest::for_types(rule_types))
            .await
    }

    /// Match facts with explicit selection options.
    ///
    /// Results are cached per fact fingerprint, version and selection
    /// variant. A timeout leaves the computation running so that a retry
    /// is likely to hit the cache.
    #[instrument(skip_all, fields(ranked = request.ranked))]
    pub async fn match_with(
        &self,
        facts: &FactContext,
        request: &MatchRequest,
    ) -> Result<MatchResult, EngineError> {
        let inner = &self.inner;
        inner.metrics.increment_matches();

        let index = inner.index.load_full();
        let rule_types = normalize_rule_types(request.rule_types.as_deref());
        let fingerprint = fact_fingerprint(rule_types.as_deref(), facts);
        let key = CacheKey::for_request(&fingerprint, index.version(), &request.variant());
        debug!(key = %key, version = index.version(), "matching facts");

        let options = self.select_options(request);
        let facts = facts.clone();
        let adapters = Arc::clone(&inner.adapters);
        let metrics = Arc::clone(&inner.metrics);

        let result = inner
            .cache
            .get_or_compute(key, move || async move {
                Ok(compute_match(
                    &index,
                    &adapters,
                    &metrics,
                    rule_types.as_deref(),
                    &facts,
                    &options,
                )
                .await)
            })
            .await;

        match result {
            Ok(set) => Ok(MatchResult::from(set.as_ref())),
            Err(e) => {
                if matches!(e, CacheError::Timeout(_)) {
                    inner.metrics.increment_match_timeouts();
                }
                Err(e.into())
            }
        }
    }

    fn select_options(&self, request: &MatchRequest) -> SelectOptions {
        if !request.ranked {
            return SelectOptions::filtered();
        }
        let options = SelectOptions::ranked(self.inner.weights);
        match &request.segment {
            Some(segment) => options.with_segment(segment.clone()),
            None => options,
        }
    }

    /// Register a query adapter and flush cached results.
    pub async fn register_adapter(&self, name: impl Into<String>, adapter: Arc<dyn QueryAdapter>) {
        let name = name.into();
        if self.inner.adapters.register(name.clone(), adapter).is_some() {
            debug!(adapter = %name, "replaced query adapter");
        }
        self.flush_after_adapter_change(&name).await;
    }

    /// Remove a query adapter and flush cached results.
    ///
    /// Returns `false` when no adapter was registered under `name`.
    pub async fn unregister_adapter(&self, name: &str) -> bool {
        let removed = self.inner.adapters.unregister(name);
        if removed {
            self.flush_after_adapter_change(name).await;
        }
        removed
    }

    async fn flush_after_adapter_change(&self, name: &str) {
        if let Err(e) = self.inner.cache.invalidate_all().await {
            warn!(adapter = %name, error = %e, "cache flush after adapter change failed");
        }
    }

    /// Registered adapter names, sorted.
    #[must_use]
    pub fn adapters(&self) -> Vec<String> {
        self.inner.adapters.names()
    }

    /// Rules of the serving generation, optionally of one type, in id order.
    #[must_use]
    pub fn list_rules(&self, rule_type: Option<&RuleType>) -> Vec<RuleRecord> {
        self.index()
            .rules()
            .iter()
            .filter(|r| rule_type.is_none_or(|t| r.rule_type() == t))
            .map(|r| r.record.clone())
            .collect()
    }

    /// The serving index generation.
    #[must_use]
    pub fn index(&self) -> Arc<RuleIndex> {
        self.inner.index.load_full()
    }

    /// Version of the serving generation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.index.load().version()
    }

    /// Subscribe to installed versions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.version_tx.subscribe()
    }

    #[must_use]
    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.inner.metrics
    }

    #[must_use]
    pub fn cache_metrics(&self) -> &Arc<CacheMetrics> {
        self.inner.cache.metrics()
    }

    /// Point-in-time view for operators.
    #[must_use]
    pub fn status(&self) -> EngineStatus {
        let index = self.index();
        let status = self.inner.status.lock().clone();
        EngineStatus {
            version: index.version(),
            rule_count: index.len(),
            rule_types: index.rule_types().cloned().collect(),
            malformed_codes: index.malformed().iter().map(|m| m.code.clone()).collect(),
            tracker_state: status.state,
            last_reload_at: status.last_reload_at,
            last_checked_at: status.last_checked_at,
            last_error: status.last_error,
            adapters: self.adapters(),
        }
    }
}

/// Evaluate, select and resolve content against one index generation.
async fn compute_match(
    index: &RuleIndex,
    adapters: &AdapterRegistry,
    metrics: &EngineMetrics,
    rule_types: Option<&[RuleType]>,
    facts: &FactContext,
    options: &SelectOptions,
) -> MatchSet {
    let candidates = index.matching(rule_types, facts);
    let selected = select(&candidates, options);

    let mut rules = Vec::with_capacity(selected.len());
    for Selected { rule, score } in selected {
        let (content, content_source) = adapters.resolve_content(&rule.content, facts).await;
        if content_source == ContentSource::Default {
            metrics.increment_adapter_fallbacks();
        }
        let record = &rule.record;
        rules.push(MatchedRule {
            id: record.id,
            code: record.code.clone(),
            name: record.name.clone(),
            rule_type: record.rule_type.clone(),
            priority: record.priority,
            description: record.description.clone(),
            tags: record.tags.clone(),
            score,
            content,
            content_source,
        });
    }

    MatchSet {
        version: index.version(),
        rules,
    }
}
