pub mod eval;
pub mod index;
pub mod selector;
