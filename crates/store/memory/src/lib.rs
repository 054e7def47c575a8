mod store;

pub use store::{MemoryRuleStore, SeedFile};
