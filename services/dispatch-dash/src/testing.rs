// services/dispatch-dash/src/testing.rs
//
// Shared fixtures for unit tests: sample payloads and a counting backend stub

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use svckit::errors::DashError;
use svckit::types::{
    AreaTraffic, DashboardSummary, Feed, FestivalSnapshot, OptimizedRoute, OrderedMap,
    PendingOrder, RouteLeg, Temperature, TrafficConditions, TrafficSnapshot, WeatherSnapshot,
    Wind,
};

use crate::adapter::DataSourceAdapter;
use crate::api::DeliveryApi;
use crate::store::DashboardStore;

pub fn sample_weather(conditions: &str) -> WeatherSnapshot {
    WeatherSnapshot {
        conditions: conditions.to_string(),
        temperature: Some(Temperature::Detailed {
            current: 31.0,
            feels_like: Some(34.0),
            units: "C".into(),
        }),
        humidity: Some(70.0),
        wind: Some(Wind { speed: Some(12.0) }),
    }
}

pub fn area(level: f64) -> AreaTraffic {
    AreaTraffic {
        congestion_level: level,
        delay_minutes: level * 2.0,
        status: None,
    }
}

pub fn sample_traffic() -> TrafficSnapshot {
    TrafficSnapshot {
        overall_city_congestion: Some(5.0),
        status: Some("Moderate traffic".into()),
        areas: [
            ("Harbor", area(3.0)),
            ("Downtown", area(8.0)),
            ("Airport", area(6.0)),
            ("Old Town", area(8.0)),
            ("Suburbs", area(1.0)),
        ]
        .into_iter()
        .collect(),
    }
}

pub fn order(id: &str, area: &str) -> PendingOrder {
    PendingOrder {
        order_id: id.to_string(),
        customer_name: format!("Customer {}", id),
        address: format!("{} Main St", id),
        package_size: "Medium".into(),
        area: area.to_string(),
    }
}

pub fn sample_orders() -> Vec<PendingOrder> {
    vec![order("A", "North"), order("B", "North"), order("C", "South")]
}

pub fn sample_route(order_ids: &[String]) -> OptimizedRoute {
    let mut from = "Warehouse".to_string();
    let legs = order_ids
        .iter()
        .map(|id| {
            let leg = RouteLeg {
                from: from.clone(),
                to: id.clone(),
                from_address: format!("{} address", from),
                to_address: format!("{} address", id),
                distance: Some("2.4 km".into()),
                duration: Some("9 min".into()),
                traffic_conditions: Some(TrafficConditions::Moderate),
            };
            from = id.clone();
            leg
        })
        .collect();
    OptimizedRoute {
        total_distance: format!("{:.1} km", 2.4 * order_ids.len() as f64),
        total_duration: format!("{} min", 9 * order_ids.len()),
        legs,
    }
}

/// Backend stub that counts calls per feed and can fail selected feeds.
#[derive(Default)]
pub struct StubApi {
    calls: [AtomicUsize; Feed::COUNT],
    failing: Mutex<HashSet<Feed>>,
    weather_delays: Mutex<VecDeque<Duration>>,
    orders: Mutex<Option<Vec<PendingOrder>>>,
    pub optimized: Mutex<Vec<Vec<String>>>,
}

impl StubApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self, feed: Feed) -> usize {
        self.calls[feed.index()].load(Ordering::SeqCst)
    }

    pub fn fail(&self, feed: Feed) {
        self.failing.lock().insert(feed);
    }

    /// Delays applied to successive weather calls, in call order.
    pub fn delay_weather(&self, delays: impl IntoIterator<Item = Duration>) {
        self.weather_delays.lock().extend(delays);
    }

    pub fn set_orders(&self, orders: Vec<PendingOrder>) {
        *self.orders.lock() = Some(orders);
    }

    fn enter(&self, feed: Feed) -> Result<usize, DashError> {
        let call = self.calls[feed.index()].fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing.lock().contains(&feed) {
            return Err(DashError::Network(format!("{} backend unavailable", feed)));
        }
        Ok(call)
    }
}

#[async_trait]
impl DeliveryApi for StubApi {
    async fn fetch_weather(&self) -> Result<WeatherSnapshot, DashError> {
        let delay = self.weather_delays.lock().pop_front();
        let call = self.calls[Feed::Weather.index()].fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().contains(&Feed::Weather) {
            return Err(DashError::Network("weather backend unavailable".into()));
        }
        Ok(sample_weather(&format!("Clear, call {}", call)))
    }

    async fn fetch_traffic(&self) -> Result<TrafficSnapshot, DashError> {
        self.enter(Feed::Traffic)?;
        Ok(sample_traffic())
    }

    async fn fetch_festivals(&self) -> Result<FestivalSnapshot, DashError> {
        self.enter(Feed::Festivals)?;
        Ok(FestivalSnapshot::default())
    }

    async fn fetch_dashboard_summary(&self) -> Result<DashboardSummary, DashError> {
        self.enter(Feed::Summary)?;
        Ok(DashboardSummary {
            total_deliveries: 42,
            delivery_success_rate: 90.0,
            failure_by_reason: Some(OrderedMap::new()),
            ..DashboardSummary::default()
        })
    }

    async fn fetch_pending_orders(&self) -> Result<Vec<PendingOrder>, DashError> {
        self.enter(Feed::PendingOrders)?;
        Ok(self.orders.lock().clone().unwrap_or_else(sample_orders))
    }

    async fn optimize_route(&self, order_ids: &[String]) -> Result<OptimizedRoute, DashError> {
        self.enter(Feed::Route)?;
        self.optimized.lock().push(order_ids.to_vec());
        Ok(sample_route(order_ids))
    }
}

pub fn adapter_with(api: Arc<StubApi>) -> (DataSourceAdapter, Arc<DashboardStore>) {
    let store = Arc::new(DashboardStore::default());
    (DataSourceAdapter::new(api, store.clone()), store)
}

/// Let spawned fetch tasks run to completion under a paused clock.
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}
