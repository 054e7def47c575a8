//! The Augur matching engine.
//!
//! [`Engine`] answers "which rules apply to these facts" from an immutable,
//! atomically swapped [`RuleIndex`](augur_rules::RuleIndex) generation,
//! caching results in a two-tier [`CacheManager`](augur_cache::CacheManager).
//! A [`VersionTracker`] keeps the index in step with the rule store.

pub mod builder;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod tracker;
pub mod types;

pub use builder::EngineBuilder;
pub use engine::Engine;
pub use error::EngineError;
pub use metrics::{EngineMetrics, EngineMetricsSnapshot};
pub use tracker::{TrackerConfig, TrackerState, VersionTracker};
pub use types::{EngineStatus, MatchRequest, MatchResult, ReloadOutcome, VersionCheck};
