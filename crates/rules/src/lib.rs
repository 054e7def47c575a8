pub mod adapter;
pub mod engine;
pub mod error;
pub mod ir;

pub use adapter::{AdapterRegistry, FnAdapter, QueryAdapter, TableAdapter};
pub use engine::eval::evaluate;
pub use engine::index::{MalformedRule, RuleIndex};
pub use engine::selector::{RankingWeights, SelectOptions, Selected, select};
pub use error::{AdapterError, RuleError};
pub use ir::condition::{Condition, Gender};
pub use ir::content::RuleContent;
pub use ir::rule::CompiledRule;
