use std::time::Duration;

use thiserror::Error;

/// Errors from cache operations.
///
/// `Clone` so that one computation's outcome can be handed to every caller
/// waiting on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// The shared (L2) tier could not be reached.
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    #[error("cache serialization error: {0}")]
    Serialization(String),

    /// The caller stopped waiting; the computation keeps running.
    #[error("cache computation timed out after {0:?}")]
    Timeout(Duration),

    /// The value computation itself failed.
    #[error("computation failed: {0}")]
    Compute(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
