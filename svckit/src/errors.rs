use thiserror::Error;

use crate::types::Feed;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("No {0} data available")]
    EmptyData(Feed),

    #[error("Select at least one order before optimizing a route")]
    EmptySelection,

    #[error("Stale {0} result discarded")]
    Stale(Feed),

    #[error("Unknown order: {0}")]
    UnknownOrder(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metrics error: {0}")]
    Metrics(String),
}

impl DashError {
    pub fn is_stale(&self) -> bool {
        matches!(self, DashError::Stale(_))
    }
}

impl From<reqwest::Error> for DashError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DashError::Decode(err.to_string())
        } else if err.is_timeout() {
            DashError::Network(format!("request timed out: {}", err))
        } else {
            DashError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DashError {
    fn from(err: serde_json::Error) -> Self {
        DashError::Decode(err.to_string())
    }
}

impl From<config::ConfigError> for DashError {
    fn from(err: config::ConfigError) -> Self {
        DashError::Config(err.to_string())
    }
}
