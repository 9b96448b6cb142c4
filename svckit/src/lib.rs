pub mod config;
pub mod errors;
pub mod metrics;
pub mod types;
