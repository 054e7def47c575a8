pub mod error;
pub mod fact;
pub mod fingerprint;
pub mod outcome;
pub mod rule;
pub mod types;
pub mod version;

pub use error::CoreError;
pub use fact::FactContext;
pub use fingerprint::{cache_key, fact_fingerprint, normalize_rule_types};
pub use outcome::{ContentSource, MatchSet, MatchedRule};
pub use rule::RuleRecord;
pub use types::{RuleCode, RuleType};
pub use version::RuleVersion;
