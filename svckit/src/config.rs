use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use crate::errors::DashError;
use crate::types::Feed;

pub const ENV_PREFIX: &str = "DISPATCH_DASH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api: ApiConfig,
    pub refresh: RefreshConfig,
    pub display: DisplayConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: u64,
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval_secs: 5 * 60 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub top_congested: usize,
    pub activity_log_capacity: usize,
    pub recent_activity_limit: usize,
    /// Error banner priority on the dashboard screen, first error wins.
    pub dashboard_error_priority: Vec<Feed>,
    /// Error banner priority on the route screen, first error wins.
    pub route_error_priority: Vec<Feed>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            top_congested: 3,
            activity_log_capacity: 100,
            recent_activity_limit: 5,
            dashboard_error_priority: vec![
                Feed::Summary,
                Feed::Weather,
                Feed::Traffic,
                Feed::Festivals,
            ],
            route_error_priority: vec![
                Feed::PendingOrders,
                Feed::Route,
                Feed::Weather,
                Feed::Traffic,
                Feed::Festivals,
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_file: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: "dispatch-dash.log".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<(), DashError> {
        if self.refresh.interval_secs == 0 {
            return Err(DashError::Config("refresh.interval_secs must be positive".into()));
        }
        if self.display.top_congested == 0 {
            return Err(DashError::Config("display.top_congested must be positive".into()));
        }
        if self.display.activity_log_capacity == 0 {
            return Err(DashError::Config(
                "display.activity_log_capacity must be positive".into(),
            ));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(DashError::Config("api.base_url must not be empty".into()));
        }
        Ok(())
    }
}

/// Load the dashboard configuration from an optional file, then `DISPATCH_DASH__*` env vars.
pub fn load_config(path: &str) -> Result<DashboardConfig, DashError> {
    let config = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    let config: DashboardConfig = config.try_deserialize()?;
    config.validate()?;

    info!(
        "Loaded configuration: api={}, refresh every {}s, top {} congested areas",
        config.api.base_url, config.refresh.interval_secs, config.display.top_congested
    );
    Ok(config)
}
