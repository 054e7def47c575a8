pub mod error;
pub mod stats;
pub mod store;
pub mod testing;

pub use error::StoreError;
pub use stats::CacheStatsRow;
pub use store::{RuleSnapshot, RuleStore, RuleWriter};
