// services/dispatch-dash/src/api.rs
//
// Backend contract for the dashboard feeds and its HTTP implementation

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use svckit::config::ApiConfig;
use svckit::errors::DashError;
use svckit::types::{
    DashboardSummary, Feed, FestivalSnapshot, OptimizeRequest, OptimizedRoute, PendingOrder,
    TrafficSnapshot, WeatherSnapshot,
};

/// One request per call; failures carry display text for the feed banner.
#[async_trait]
pub trait DeliveryApi: Send + Sync {
    async fn fetch_weather(&self) -> Result<WeatherSnapshot, DashError>;
    async fn fetch_traffic(&self) -> Result<TrafficSnapshot, DashError>;
    async fn fetch_festivals(&self) -> Result<FestivalSnapshot, DashError>;
    async fn fetch_dashboard_summary(&self) -> Result<DashboardSummary, DashError>;
    async fn fetch_pending_orders(&self) -> Result<Vec<PendingOrder>, DashError>;
    async fn optimize_route(&self, order_ids: &[String]) -> Result<OptimizedRoute, DashError>;
}

pub struct HttpDeliveryApi {
    client: Client,
    base_url: String,
}

impl HttpDeliveryApi {
    pub fn new(config: &ApiConfig) -> Result<Self, DashError> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, feed: Feed) -> Result<T, DashError> {
        let response = self.client.get(self.url(path)).send().await?;
        read_payload(response, feed).await
    }
}

async fn read_payload<T: DeserializeOwned>(response: Response, feed: Feed) -> Result<T, DashError> {
    let status = response.status();
    if !status.is_success() {
        return Err(DashError::Network(format!("HTTP {}", status)));
    }
    let body: serde_json::Value = response.json().await?;
    decode_body(body, feed)
}

/// Decode a response body, treating `null` as a missing payload.
pub fn decode_body<T: DeserializeOwned>(body: serde_json::Value, feed: Feed) -> Result<T, DashError> {
    if body.is_null() {
        return Err(DashError::EmptyData(feed));
    }
    Ok(serde_json::from_value(body)?)
}

#[async_trait]
impl DeliveryApi for HttpDeliveryApi {
    async fn fetch_weather(&self) -> Result<WeatherSnapshot, DashError> {
        self.get_json("realtime/weather", Feed::Weather).await
    }

    async fn fetch_traffic(&self) -> Result<TrafficSnapshot, DashError> {
        self.get_json("realtime/traffic", Feed::Traffic).await
    }

    async fn fetch_festivals(&self) -> Result<FestivalSnapshot, DashError> {
        self.get_json("realtime/festivals", Feed::Festivals).await
    }

    async fn fetch_dashboard_summary(&self) -> Result<DashboardSummary, DashError> {
        self.get_json("dashboard", Feed::Summary).await
    }

    async fn fetch_pending_orders(&self) -> Result<Vec<PendingOrder>, DashError> {
        self.get_json("orders/pending", Feed::PendingOrders).await
    }

    async fn optimize_route(&self, order_ids: &[String]) -> Result<OptimizedRoute, DashError> {
        let response = self
            .client
            .post(self.url("routes/optimize"))
            .json(&OptimizeRequest { order_ids })
            .send()
            .await?;
        read_payload(response, Feed::Route).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = HttpDeliveryApi::new(&ApiConfig {
            base_url: "http://dispatch.local/api///".into(),
            timeout_ms: 500,
        })
        .unwrap();
        assert_eq!(api.base_url(), "http://dispatch.local/api");
        assert_eq!(api.url("/orders/pending"), "http://dispatch.local/api/orders/pending");
    }

    #[test]
    fn test_null_body_is_empty_data() {
        let err = decode_body::<WeatherSnapshot>(serde_json::Value::Null, Feed::Weather).unwrap_err();
        assert!(matches!(err, DashError::EmptyData(Feed::Weather)));
        assert_eq!(err.to_string(), "No weather data available");
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        let err = decode_body::<Vec<PendingOrder>>(json!({"orders": 3}), Feed::PendingOrders)
            .unwrap_err();
        assert!(matches!(err, DashError::Decode(_)));
    }

    #[test]
    fn test_summary_body_decodes() {
        let summary: DashboardSummary = decode_body(
            json!({
                "total_deliveries": 120,
                "delivery_success_rate": 94.5,
                "average_delivery_time": 38,
                "failed_deliveries": 7,
                "failure_by_reason": {"Address not found": 4, "Customer absent": 3},
                "recent_activities": [
                    {"action": "Delivery", "time": "5 min ago", "details": "Order #1042"}
                ]
            }),
            Feed::Summary,
        )
        .unwrap();
        assert_eq!(summary.total_deliveries, 120);
        assert_eq!(summary.failure_by_reason.unwrap().len(), 2);
        assert_eq!(summary.recent_activities[0].action, "Delivery");
    }

    #[test]
    fn test_null_fields_do_not_fail_the_feed() {
        let weather: WeatherSnapshot =
            decode_body(json!({"conditions": null, "humidity": 50}), Feed::Weather).unwrap();
        assert_eq!(weather.conditions, "");

        let summary: DashboardSummary = decode_body(
            json!({"total_deliveries": null, "delivery_success_rate": 91.0, "failed_deliveries": null}),
            Feed::Summary,
        )
        .unwrap();
        assert_eq!(summary.total_deliveries, 0);
        assert_eq!(summary.failed_deliveries, 0);
        assert_eq!(summary.delivery_success_rate, 91.0);
    }
}
