//! Version tracking and index hot reload.
//!
//! All checks and reloads are serialized by one async lock, so at most one
//! store read is in flight and index generations are installed in order.
//! A failed check or reload leaves the serving index untouched.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, instrument, warn};

use augur_rules::RuleIndex;
use augur_store::{CacheStatsRow, StoreError};

use crate::engine::Engine;
use crate::error::EngineError;
use crate::types::{ReloadOutcome, VersionCheck};

/// What the tracker is doing right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerState {
    #[default]
    Idle,
    Checking,
    Reloading,
}

impl TrackerState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::Reloading => "reloading",
        }
    }
}

/// Bookkeeping shown by [`Engine::status`].
#[derive(Debug, Clone, Default)]
pub(crate) struct TrackerStatus {
    pub state: TrackerState,
    pub last_reload_at: Option<DateTime<Utc>>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Intervals of the background tracker task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// How often the store version is compared with the loaded one.
    pub poll_interval: Duration,
    /// How often per-day cache statistics are written to the store.
    pub stats_flush_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            stats_flush_interval: Duration::from_secs(300),
        }
    }
}

impl Engine {
    /// Compare the store version with the loaded one and reload on change.
    ///
    /// Store failures are returned to the caller; the serving index is kept.
    #[instrument(skip_all)]
    pub async fn check_version(&self) -> Result<VersionCheck, EngineError> {
        let inner = self.inner();
        let _guard = inner.reload_lock.lock().await;
        inner.metrics.increment_version_checks();
        self.set_state(TrackerState::Checking);

        let result = self.check_locked().await;
        self.finish(result.as_ref().err().map(ToString::to_string));
        result
    }

    async fn check_locked(&self) -> Result<VersionCheck, EngineError> {
        let loaded = self.version();
        let stored = self.inner().store.current_version().await?;
        if stored.rule_version == loaded {
            debug!(version = loaded, "rule version unchanged");
            return Ok(VersionCheck {
                changed: false,
                current_version: loaded,
            });
        }

        info!(loaded, stored = stored.rule_version, "rule version changed, reloading");
        self.set_state(TrackerState::Reloading);
        let index = self.load_index().await?;
        let changed = index.version() != loaded;
        if changed {
            self.install(index).await;
        }
        Ok(VersionCheck {
            changed,
            current_version: self.version(),
        })
    }

    /// One background poll. Returns whether a new generation was installed.
    ///
    /// Errors are logged as degraded freshness and retried on the next poll.
    pub async fn poll_once(&self) -> bool {
        match self.check_version().await {
            Ok(check) => check.changed,
            Err(e) => {
                warn!(
                    error = %e,
                    serving_version = self.version(),
                    "version check failed, serving possibly stale rules"
                );
                false
            }
        }
    }

    /// Rebuild the index from the store regardless of version.
    ///
    /// Reloading an unchanged store yields the same generation again.
    #[instrument(skip_all)]
    pub async fn reload_all(&self) -> ReloadOutcome {
        let inner = self.inner();
        let _guard = inner.reload_lock.lock().await;
        self.set_state(TrackerState::Reloading);

        let outcome = match self.load_index().await {
            Ok(index) => {
                let outcome = ReloadOutcome {
                    success: true,
                    version: index.version(),
                    rule_count: index.len(),
                    malformed: index.malformed().to_vec(),
                    error: None,
                };
                self.install(index).await;
                outcome
            }
            Err(e) => {
                let current = self.index();
                ReloadOutcome {
                    success: false,
                    version: current.version(),
                    rule_count: current.len(),
                    malformed: current.malformed().to_vec(),
                    error: Some(e.to_string()),
                }
            }
        };
        self.finish(outcome.error.clone());
        outcome
    }

    /// Write drained per-day cache statistics to the store.
    ///
    /// On failure the drained counts are put back for the next attempt.
    pub async fn flush_cache_stats(&self) -> Result<usize, EngineError> {
        let inner = self.inner();
        let daily = inner.cache.metrics().drain_daily();
        if daily.is_empty() {
            return Ok(0);
        }
        let rows: Vec<CacheStatsRow> = daily
            .iter()
            .map(|d| CacheStatsRow::new(d.date, d.tier.as_str(), d.hits, d.misses))
            .filter(|r| !r.is_empty())
            .collect();

        match inner.store.record_cache_stats(&rows).await {
            Ok(()) => {
                inner.metrics.increment_stats_flushes();
                debug!(rows = rows.len(), "cache statistics persisted");
                Ok(rows.len())
            }
            Err(e) => {
                inner.cache.metrics().restore_daily(daily);
                Err(e.into())
            }
        }
    }

    async fn load_index(&self) -> Result<Arc<RuleIndex>, StoreError> {
        let inner = self.inner();
        match inner.store.load_enabled_rules().await {
            Ok(snapshot) => Ok(Arc::new(RuleIndex::build(
                snapshot.version.rule_version,
                snapshot.rules,
            ))),
            Err(e) => {
                inner.metrics.increment_reload_failures();
                warn!(error = %e, serving_version = self.version(), "rule reload failed, keeping current index");
                Err(e)
            }
        }
    }

    /// Swap in `index`, flush the cache and announce the new version.
    pub(crate) async fn install(&self, index: Arc<RuleIndex>) {
        let inner = self.inner();
        let version = index.version();
        let rule_count = index.len();
        let malformed = index.malformed().len();

        let previous = inner.index.swap(index);
        inner
            .metrics
            .set_malformed_rules(u64::try_from(malformed).unwrap_or(u64::MAX));
        inner.metrics.increment_reloads();

        if inner.cache.invalidate_all().await.is_err() {
            warn!(version, "shared cache flush failed, stale entries are unreachable by key");
        }
        inner.version_tx.send_replace(version);
        inner.status.lock().last_reload_at = Some(Utc::now());

        info!(
            from = previous.version(),
            to = version,
            rules = rule_count,
            malformed,
            "rule index swapped"
        );
    }

    fn set_state(&self, state: TrackerState) {
        self.inner().status.lock().state = state;
    }

    fn finish(&self, error: Option<String>) {
        let mut status = self.inner().status.lock();
        status.state = TrackerState::Idle;
        status.last_checked_at = Some(Utc::now());
        status.last_error = error;
    }
}

/// Background task that polls the store version and flushes cache
/// statistics until shutdown is signaled.
pub struct VersionTracker {
    engine: Engine,
    config: TrackerConfig,
    shutdown_rx: mpsc::Receiver<()>,
}

impl VersionTracker {
    /// Create a tracker for `engine`.
    ///
    /// Returns the tracker and a shutdown sender.
    pub fn new(engine: Engine, config: TrackerConfig) -> (Self, mpsc::Sender<()>) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        (
            Self {
                engine,
                config,
                shutdown_rx,
            },
            shutdown_tx,
        )
    }

    /// Run until shutdown is signaled or every sender is dropped.
    pub async fn run(&mut self) {
        info!(
            poll_interval = ?self.config.poll_interval,
            stats_flush_interval = ?self.config.stats_flush_interval,
            "version tracker starting"
        );

        let mut poll_interval = interval(self.config.poll_interval);
        poll_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stats_interval = interval(self.config.stats_flush_interval);
        stats_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("version tracker received shutdown signal");
                    break;
                }
                _ = poll_interval.tick() => {
                    self.engine.poll_once().await;
                }
                _ = stats_interval.tick() => {
                    if let Err(e) = self.engine.flush_cache_stats().await {
                        error!(error = %e, "error flushing cache statistics");
                    }
                }
            }
        }

        if let Err(e) = self.engine.flush_cache_stats().await {
            error!(error = %e, "error flushing cache statistics on shutdown");
        }
        info!("version tracker stopped");
    }

    /// Spawn the tracker onto the current runtime.
    pub fn spawn(mut self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }
}
