use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use tracing::info;

use augur_core::{RuleRecord, RuleVersion};
use augur_store::{CacheStatsRow, RuleSnapshot, RuleStore, RuleWriter, StoreError};

/// On-disk seed format: `{"version": 3, "rules": [...]}`.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub rules: Vec<RuleRecord>,
}

#[derive(Debug, Default)]
struct Inner {
    rules: BTreeMap<i64, RuleRecord>,
    version: RuleVersion,
}

/// In-memory [`RuleStore`].
///
/// Rules and the version counter live behind one lock so a snapshot never
/// mixes generations. The store can be switched to "unavailable" to exercise
/// outage handling.
#[derive(Debug)]
pub struct MemoryRuleStore {
    inner: RwLock<Inner>,
    available: AtomicBool,
    loads: AtomicUsize,
    stats: Mutex<BTreeMap<(chrono::NaiveDate, String), (u64, u64)>>,
}

impl Default for MemoryRuleStore {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            available: AtomicBool::new(true),
            loads: AtomicUsize::new(0),
            stats: Mutex::new(BTreeMap::new()),
        }
    }
}

impl MemoryRuleStore {
    /// Create a new, empty store at version 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `rules` at version 1.
    pub fn with_rules(rules: impl IntoIterator<Item = RuleRecord>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.write();
            for rule in rules {
                inner.rules.insert(rule.id, rule);
            }
        }
        store
    }

    /// Load a store from a JSON seed file.
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Backend(format!("reading {}: {e}", path.display())))?;
        let seed: SeedFile = serde_json::from_str(&raw)?;
        let store = Self::from_seed(seed);
        info!(path = %path.display(), rules = store.rule_count(), "loaded rule seed file");
        Ok(store)
    }

    /// Build a store from an already parsed seed.
    pub fn from_seed(seed: SeedFile) -> Self {
        let store = Self::with_rules(seed.rules);
        if let Some(version) = seed.version {
            store.inner.write().version = RuleVersion::new(version.max(1));
        }
        store
    }

    /// Toggle availability. While unavailable every read fails with
    /// [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of times [`load_enabled_rules`](RuleStore::load_enabled_rules)
    /// succeeded.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// Total rules held, including disabled ones.
    pub fn rule_count(&self) -> usize {
        self.inner.read().rules.len()
    }

    /// Cache statistics recorded so far, as `(hits, misses)` per day and tier.
    pub fn recorded_stats(&self, tier: &str) -> (u64, u64) {
        self.stats
            .lock()
            .iter()
            .filter(|((_, t), _)| t == tier)
            .fold((0, 0), |(h, m), (_, (hits, misses))| (h + hits, m + misses))
    }

    /// Bump the version without touching any rule.
    pub fn bump_version(&self) -> RuleVersion {
        let mut inner = self.inner.write();
        inner.version = inner.version.bumped();
        inner.version
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store switched off".into()))
        }
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn current_version(&self) -> Result<RuleVersion, StoreError> {
        self.check_available()?;
        Ok(self.inner.read().version)
    }

    async fn load_enabled_rules(&self) -> Result<RuleSnapshot, StoreError> {
        self.check_available()?;
        let inner = self.inner.read();
        let snapshot = RuleSnapshot {
            version: inner.version,
            rules: inner.rules.values().filter(|r| r.enabled).cloned().collect(),
        };
        self.loads.fetch_add(1, Ordering::Relaxed);
        Ok(snapshot)
    }

    async fn record_cache_stats(&self, rows: &[CacheStatsRow]) -> Result<(), StoreError> {
        self.check_available()?;
        let mut stats = self.stats.lock();
        for row in rows {
            let entry = stats.entry((row.stat_date, row.tier.clone())).or_default();
            entry.0 += row.hits;
            entry.1 += row.misses;
        }
        Ok(())
    }
}

#[async_trait]
impl RuleWriter for MemoryRuleStore {
    async fn upsert_rule(&self, mut rule: RuleRecord) -> Result<RuleVersion, StoreError> {
        self.check_available()?;
        let mut inner = self.inner.write();
        if let Some(other) = inner
            .rules
            .values()
            .find(|r| r.code == rule.code && r.id != rule.id)
        {
            return Err(StoreError::Backend(format!(
                "code '{}' already used by rule {}",
                rule.code, other.id
            )));
        }
        let now = Utc::now();
        rule.created_at = inner
            .rules
            .get(&rule.id)
            .and_then(|existing| existing.created_at)
            .or(Some(now));
        rule.updated_at = Some(now);
        inner.rules.insert(rule.id, rule);
        inner.version = inner.version.bumped();
        Ok(inner.version)
    }

    async fn set_enabled(&self, code: &str, enabled: bool) -> Result<RuleVersion, StoreError> {
        self.check_available()?;
        let mut inner = self.inner.write();
        let rule = inner
            .rules
            .values_mut()
            .find(|r| r.code.as_str() == code)
            .ok_or_else(|| StoreError::NotFound(code.to_owned()))?;
        rule.enabled = enabled;
        rule.updated_at = Some(Utc::now());
        inner.version = inner.version.bumped();
        Ok(inner.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use augur_store::testing::run_store_conformance_tests;
    use serde_json::json;

    #[tokio::test]
    async fn conformance() {
        let store = MemoryRuleStore::new();
        run_store_conformance_tests(&store, &store).await.unwrap();
    }

    #[tokio::test]
    async fn unavailable_store_fails_reads() {
        let store = MemoryRuleStore::new();
        store.set_available(false);
        assert!(store.current_version().await.unwrap_err().is_unavailable());
        assert!(store.load_enabled_rules().await.is_err());
        store.set_available(true);
        assert!(store.load_enabled_rules().await.is_ok());
        assert_eq!(store.load_count(), 1);
    }

    #[tokio::test]
    async fn seed_sets_version_and_rules() {
        let seed: SeedFile = serde_json::from_value(json!({
            "version": 12,
            "rules": [
                {"id": 1, "code": "A", "type": "career", "conditions": {}, "content": "a"},
                {"id": 2, "code": "B", "type": "career", "enabled": false}
            ]
        }))
        .unwrap();
        let store = MemoryRuleStore::from_seed(seed);
        assert_eq!(store.current_version().await.unwrap().rule_version, 12);
        let snapshot = store.load_enabled_rules().await.unwrap();
        assert_eq!(snapshot.rules.len(), 1);
        assert_eq!(store.rule_count(), 2);
    }

    #[tokio::test]
    async fn seed_file_round_trip_from_disk() {
        let path = std::env::temp_dir().join(format!("augur-seed-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"rules":[{"id":7,"code":"SEEDED","type":"career"}]}"#,
        )
        .unwrap();
        let store = MemoryRuleStore::from_seed_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(store.rule_count(), 1);
        assert_eq!(store.current_version().await.unwrap().rule_version, 1);

        assert!(MemoryRuleStore::from_seed_file("/nonexistent/seed.json").is_err());
    }

    #[tokio::test]
    async fn duplicate_code_is_rejected() {
        let store = MemoryRuleStore::new();
        store
            .upsert_rule(RuleRecord::new(1, "DUP", "career", json!({}), json!(null)))
            .await
            .unwrap();
        let err = store
            .upsert_rule(RuleRecord::new(2, "DUP", "career", json!({}), json!(null)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn stats_accumulate() {
        let store = MemoryRuleStore::new();
        let day = Utc::now().date_naive();
        store
            .record_cache_stats(&[CacheStatsRow::new(day, "l1", 2, 1)])
            .await
            .unwrap();
        store
            .record_cache_stats(&[CacheStatsRow::new(day, "l1", 1, 0)])
            .await
            .unwrap();
        assert_eq!(store.recorded_stats("l1"), (3, 1));
        assert_eq!(store.recorded_stats("l2"), (0, 0));
    }
}
