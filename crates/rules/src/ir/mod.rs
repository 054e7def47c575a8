pub mod condition;
pub mod content;
pub mod rule;
