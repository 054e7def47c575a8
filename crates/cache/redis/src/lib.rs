pub mod config;
mod store;

pub use config::RedisConfig;
pub use store::RedisSharedCache;
