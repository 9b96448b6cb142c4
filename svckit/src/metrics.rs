use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder,
    HistogramVec, IntCounterVec, IntGauge, TextEncoder,
};

use crate::errors::DashError;
use crate::types::Feed;

lazy_static! {
    pub static ref FEED_FETCH_DURATION: HistogramVec = register_histogram_vec!(
        "feed_fetch_duration_seconds",
        "Feed fetch duration in seconds",
        &["feed", "status"]
    ).unwrap();

    pub static ref FEED_FETCH_COUNTER: IntCounterVec = register_int_counter_vec!(
        "feed_fetch_total",
        "Total number of feed fetches",
        &["feed", "status"]
    ).unwrap();

    pub static ref ACTIVE_POLLERS: IntGauge = register_int_gauge!(
        "active_pollers",
        "Number of mounted screen pollers"
    ).unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Success,
    Failure,
    Stale,
}

impl FetchOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            FetchOutcome::Success => "success",
            FetchOutcome::Failure => "failure",
            FetchOutcome::Stale => "stale",
        }
    }
}

pub fn record_fetch(feed: Feed, outcome: FetchOutcome, duration: f64) {
    let status = outcome.as_str();
    FEED_FETCH_DURATION
        .with_label_values(&[feed.name(), status])
        .observe(duration);
    FEED_FETCH_COUNTER
        .with_label_values(&[feed.name(), status])
        .inc();
}

/// Render every registered metric in the Prometheus text format.
pub fn encode_text() -> Result<String, DashError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| DashError::Metrics(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| DashError::Metrics(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_fetch_counts_by_outcome() {
        let before = FEED_FETCH_COUNTER
            .with_label_values(&["festivals", "stale"])
            .get();
        record_fetch(Feed::Festivals, FetchOutcome::Stale, 0.01);
        let after = FEED_FETCH_COUNTER
            .with_label_values(&["festivals", "stale"])
            .get();
        assert_eq!(after, before + 1);
        assert!(encode_text().unwrap().contains("feed_fetch_total"));
    }
}
