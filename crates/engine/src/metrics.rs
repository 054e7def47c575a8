use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters tracking engine behaviour.
///
/// All counters use relaxed ordering. For a consistent point-in-time view,
/// call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Match requests received.
    pub matches: AtomicU64,
    /// Match requests that timed out.
    pub match_timeouts: AtomicU64,
    /// Version checks performed (background and explicit).
    pub version_checks: AtomicU64,
    /// Successful index swaps.
    pub reloads: AtomicU64,
    /// Reload attempts that kept the previous index.
    pub reload_failures: AtomicU64,
    /// Dynamic contents that fell back to their default.
    pub adapter_fallbacks: AtomicU64,
    /// Malformed rules in the current index generation.
    pub malformed_rules: AtomicU64,
    /// Cache statistics flushes that reached the store.
    pub stats_flushes: AtomicU64,
}

impl EngineMetrics {
    pub fn increment_matches(&self) {
        self.matches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_match_timeouts(&self) {
        self.match_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_version_checks(&self) {
        self.version_checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reloads(&self) {
        self.reloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reload_failures(&self) {
        self.reload_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_adapter_fallbacks(&self) {
        self.adapter_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_malformed_rules(&self, count: u64) {
        self.malformed_rules.store(count, Ordering::Relaxed);
    }

    pub fn increment_stats_flushes(&self) {
        self.stats_flushes.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a consistent point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> EngineMetricsSnapshot {
        EngineMetricsSnapshot {
            matches: self.matches.load(Ordering::Relaxed),
            match_timeouts: self.match_timeouts.load(Ordering::Relaxed),
            version_checks: self.version_checks.load(Ordering::Relaxed),
            reloads: self.reloads.load(Ordering::Relaxed),
            reload_failures: self.reload_failures.load(Ordering::Relaxed),
            adapter_fallbacks: self.adapter_fallbacks.load(Ordering::Relaxed),
            malformed_rules: self.malformed_rules.load(Ordering::Relaxed),
            stats_flushes: self.stats_flushes.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`EngineMetrics`] at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineMetricsSnapshot {
    pub matches: u64,
    pub match_timeouts: u64,
    pub version_checks: u64,
    pub reloads: u64,
    pub reload_failures: u64,
    pub adapter_fallbacks: u64,
    pub malformed_rules: u64,
    pub stats_flushes: u64,
}
