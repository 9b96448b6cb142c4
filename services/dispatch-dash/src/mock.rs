// services/dispatch-dash/src/mock.rs
//
// Simulated delivery backend for demo mode

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;

use svckit::errors::DashError;
use svckit::types::{
    Activity, AreaTraffic, AverageTime, DashboardSummary, Feed, Festival, FestivalSnapshot,
    OptimizedRoute, OrderedCounts, PendingOrder, RouteLeg, Temperature, TrafficConditions,
    TrafficSnapshot, WeatherSnapshot, Wind,
};

use crate::api::DeliveryApi;

const AREAS: [&str; 6] = ["Downtown", "Harbor", "Old Town", "Airport", "University", "Suburbs"];

const CONDITIONS: [&str; 7] = [
    "Clear sky",
    "Partly Cloudy",
    "Light Rain Showers",
    "Thunderstorm",
    "Morning mist",
    "Drizzle",
    "Sunny",
];

const CUSTOMERS: [&str; 8] = [
    "Ana Ruiz",
    "Ben Okafor",
    "Chen Wei",
    "Dara Kelly",
    "Elif Yilmaz",
    "Farid Haddad",
    "Grace Lin",
    "Hugo Martin",
];

pub struct MockDeliveryApi {
    latency: Duration,
    failure_rate: f64,
    orders: Mutex<Vec<PendingOrder>>,
}

impl MockDeliveryApi {
    pub fn new() -> Self {
        Self::with_latency(Duration::from_millis(400), 0.05)
    }

    /// `failure_rate` is the chance in `[0, 1]` that any single request fails.
    pub fn with_latency(latency: Duration, failure_rate: f64) -> Self {
        Self {
            latency,
            failure_rate: failure_rate.clamp(0.0, 1.0),
            orders: Mutex::new(generate_orders()),
        }
    }

    async fn simulate(&self, feed: Feed) -> Result<(), DashError> {
        let (delay, fail) = {
            let mut rng = rand::thread_rng();
            let jitter = rng.gen_range(0.5..1.5_f64);
            (self.latency.mul_f64(jitter), rng.gen_bool(self.failure_rate))
        };
        tokio::time::sleep(delay).await;
        if fail {
            return Err(DashError::Network(format!("{} service timed out", feed)));
        }
        Ok(())
    }
}

impl Default for MockDeliveryApi {
    fn default() -> Self {
        Self::new()
    }
}

fn generate_orders() -> Vec<PendingOrder> {
    let mut rng = rand::thread_rng();
    let sizes = ["Small", "Medium", "Large"];
    CUSTOMERS
        .iter()
        .enumerate()
        .map(|(i, name)| PendingOrder {
            order_id: format!("ORD-{}", 1040 + i),
            customer_name: name.to_string(),
            address: format!("{} {} Street", rng.gen_range(1..250), AREAS[i % AREAS.len()]),
            package_size: sizes[rng.gen_range(0..sizes.len())].to_string(),
            area: AREAS[i % 3].to_string(),
        })
        .collect()
}

fn random_weather() -> WeatherSnapshot {
    let mut rng = rand::thread_rng();
    let current = rng.gen_range(18.0..36.0_f64).round();
    WeatherSnapshot {
        conditions: CONDITIONS[rng.gen_range(0..CONDITIONS.len())].to_string(),
        temperature: Some(Temperature::Detailed {
            current,
            feels_like: Some(current + rng.gen_range(-2.0..4.0_f64).round()),
            units: "C".to_string(),
        }),
        humidity: Some(rng.gen_range(35.0..95.0_f64).round()),
        wind: Some(Wind {
            speed: Some(rng.gen_range(2.0..30.0_f64).round()),
        }),
    }
}

fn random_traffic() -> TrafficSnapshot {
    let mut rng = rand::thread_rng();
    let areas = AREAS
        .iter()
        .map(|name| {
            let level: f64 = (rng.gen_range(1.0..10.0_f64) * 10.0).round() / 10.0;
            let info = AreaTraffic {
                congestion_level: level,
                delay_minutes: (level * rng.gen_range(1.0..3.0_f64)).round(),
                status: None,
            };
            (*name, info)
        })
        .collect::<svckit::types::OrderedMap<_>>();
    let overall = areas.values().map(|a| a.congestion_level).sum::<f64>() / areas.len() as f64;

    TrafficSnapshot {
        overall_city_congestion: Some((overall * 10.0).round() / 10.0),
        status: Some("Live".to_string()),
        areas,
    }
}

fn random_summary() -> DashboardSummary {
    let mut rng = rand::thread_rng();
    let total: u64 = rng.gen_range(180..260);
    let failed: u64 = rng.gen_range(4..18);

    let mut failure_by_reason = OrderedCounts::new();
    let mut remaining = failed;
    for reason in ["Customer absent", "Address not found", "Damaged package"] {
        let count = rng.gen_range(0..=remaining);
        failure_by_reason.insert(reason, count);
        remaining -= count;
    }
    failure_by_reason.insert("Other", remaining);

    let delivery_by_area = AREAS
        .iter()
        .map(|area| (*area, rng.gen_range(10..60)))
        .collect();

    let weekly = (0..7).map(|_| rng.gen_range(82.0..97.0_f64).round()).collect();

    DashboardSummary {
        total_deliveries: total,
        delivery_success_rate: ((total - failed) as f64 / total as f64 * 1000.0).round() / 10.0,
        average_delivery_time: Some(AverageTime::Minutes(rng.gen_range(25.0..95.0_f64).round())),
        failed_deliveries: failed,
        failure_by_reason: Some(failure_by_reason),
        delivery_by_area: Some(delivery_by_area),
        recent_activities: vec![
            Activity {
                action: "Delivery".into(),
                time: "2 min ago".into(),
                details: format!("ORD-{} delivered in Downtown", rng.gen_range(900..1000)),
            },
            Activity {
                action: "Weather Alert".into(),
                time: "15 min ago".into(),
                details: "Rain expected after 17:00".into(),
            },
            Activity {
                action: "Failed Delivery".into(),
                time: "32 min ago".into(),
                details: "Customer absent at Harbor drop-off".into(),
            },
            Activity {
                action: "Route Optimized".into(),
                time: "1h ago".into(),
                details: "6 stops, 18.2 km".into(),
            },
        ],
        weekly_success_rate: Some(weekly),
    }
}

fn plan_route(stops: &[PendingOrder]) -> OptimizedRoute {
    let mut rng = rand::thread_rng();
    let mut from = ("Warehouse".to_string(), "1 Depot Road".to_string());
    let mut total_km = 0.0;
    let mut total_min = 0u64;

    let legs = stops
        .iter()
        .map(|stop| {
            let km: f64 = (rng.gen_range(0.8..6.5_f64) * 10.0).round() / 10.0;
            let min = (km * rng.gen_range(2.0..4.5_f64)).round() as u64;
            total_km += km;
            total_min += min;
            let traffic = match rng.gen_range(0..3) {
                0 => TrafficConditions::Light,
                1 => TrafficConditions::Moderate,
                _ => TrafficConditions::Heavy,
            };
            let leg = RouteLeg {
                from: from.0.clone(),
                to: stop.order_id.clone(),
                from_address: from.1.clone(),
                to_address: stop.address.clone(),
                distance: Some(format!("{:.1} km", km)),
                duration: Some(format!("{} min", min)),
                traffic_conditions: Some(traffic),
            };
            from = (stop.order_id.clone(), stop.address.clone());
            leg
        })
        .collect();

    OptimizedRoute {
        total_distance: format!("{:.1} km", total_km),
        total_duration: format!("{} min", total_min),
        legs,
    }
}

#[async_trait]
impl DeliveryApi for MockDeliveryApi {
    async fn fetch_weather(&self) -> Result<WeatherSnapshot, DashError> {
        self.simulate(Feed::Weather).await?;
        Ok(random_weather())
    }

    async fn fetch_traffic(&self) -> Result<TrafficSnapshot, DashError> {
        self.simulate(Feed::Traffic).await?;
        Ok(random_traffic())
    }

    async fn fetch_festivals(&self) -> Result<FestivalSnapshot, DashError> {
        self.simulate(Feed::Festivals).await?;
        Ok(FestivalSnapshot {
            festivals: vec![
                Festival {
                    name: "Harbor Lights".into(),
                    area: Some("Harbor".into()),
                    date: Some("Today 18:00".into()),
                    expected_impact: Some("High".into()),
                },
                Festival {
                    name: "Old Town Market".into(),
                    area: Some("Old Town".into()),
                    date: Some("Saturday".into()),
                    expected_impact: Some("Moderate".into()),
                },
            ],
            summary: Some("Expect closures around the waterfront this evening".into()),
        })
    }

    async fn fetch_dashboard_summary(&self) -> Result<DashboardSummary, DashError> {
        self.simulate(Feed::Summary).await?;
        Ok(random_summary())
    }

    async fn fetch_pending_orders(&self) -> Result<Vec<PendingOrder>, DashError> {
        self.simulate(Feed::PendingOrders).await?;
        Ok(self.orders.lock().clone())
    }

    async fn optimize_route(&self, order_ids: &[String]) -> Result<OptimizedRoute, DashError> {
        self.simulate(Feed::Route).await?;
        let mut orders = self.orders.lock();
        let stops: Vec<PendingOrder> = order_ids
            .iter()
            .map(|id| {
                orders
                    .iter()
                    .find(|o| &o.order_id == id)
                    .cloned()
                    .ok_or_else(|| DashError::UnknownOrder(id.clone()))
            })
            .collect::<Result<_, _>>()?;

        // Routed orders leave the pending list.
        orders.retain(|o| !order_ids.contains(&o.order_id));
        Ok(plan_route(&stops))
    }
}
