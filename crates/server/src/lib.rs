pub mod adapter_factory;
pub mod api;
pub mod cache_factory;
pub mod config;
pub mod error;
pub mod store_factory;
pub mod telemetry;
