use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// Independent data feeds backing the dashboard screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    Weather,
    Traffic,
    Festivals,
    Summary,
    PendingOrders,
    Route,
}

impl Feed {
    pub const COUNT: usize = 6;

    /// Feeds re-polled by the recurring refresh timer.
    pub const REAL_TIME: [Feed; 3] = [Feed::Weather, Feed::Traffic, Feed::Festivals];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Feed::Weather => "weather",
            Feed::Traffic => "traffic",
            Feed::Festivals => "festivals",
            Feed::Summary => "summary",
            Feed::PendingOrders => "pending_orders",
            Feed::Route => "route",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reads an explicit `null` the same as a missing key.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// String-keyed map that keeps the key order of the JSON object it was read from.
///
/// A repeated key keeps its first position and takes the last value, which is
/// how the backend's JSON objects behave in the browser.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

/// Label -> count mapping (failure reasons, deliveries per area).
pub type OrderedCounts = OrderedMap<u64>;

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.0.iter().map(|(_, v)| v)
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = OrderedMap::new();
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    #[serde(default, deserialize_with = "null_default")]
    pub conditions: String,
    pub temperature: Option<Temperature>,
    pub humidity: Option<f64>,
    pub wind: Option<Wind>,
}

/// Either the detailed object or a bare Celsius reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Temperature {
    Detailed {
        current: f64,
        feels_like: Option<f64>,
        #[serde(default = "default_units")]
        units: String,
    },
    Celsius(f64),
}

fn default_units() -> String {
    "C".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: Option<f64>,
}

// ---------------------------------------------------------------------------
// Traffic
// ---------------------------------------------------------------------------

pub const OVERALL_CONGESTION_KEY: &str = "overall_city_congestion";
pub const STATUS_KEY: &str = "status";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaTraffic {
    #[serde(default, deserialize_with = "null_default")]
    pub congestion_level: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub delay_minutes: f64,
    pub status: Option<String>,
}

/// City traffic with per-area entries under an explicit `areas` map.
///
/// Decoding also accepts the flat shape, where area objects sit next to the
/// scalar summary fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawTraffic")]
pub struct TrafficSnapshot {
    pub overall_city_congestion: Option<f64>,
    pub status: Option<String>,
    pub areas: OrderedMap<AreaTraffic>,
}

#[derive(Deserialize)]
struct RawTraffic {
    overall_city_congestion: Option<f64>,
    status: Option<String>,
    areas: Option<OrderedMap<AreaTraffic>>,
    #[serde(flatten)]
    rest: OrderedMap<serde_json::Value>,
}

impl From<RawTraffic> for TrafficSnapshot {
    fn from(raw: RawTraffic) -> Self {
        let mut areas = raw.areas.unwrap_or_default();
        for (key, value) in raw.rest.0 {
            if key == OVERALL_CONGESTION_KEY || key == STATUS_KEY || !value.is_object() {
                continue;
            }
            if let Ok(area) = serde_json::from_value::<AreaTraffic>(value) {
                areas.insert(key, area);
            }
        }
        Self {
            overall_city_congestion: raw.overall_city_congestion,
            status: raw.status,
            areas,
        }
    }
}

// ---------------------------------------------------------------------------
// Festivals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FestivalSnapshot {
    #[serde(default, deserialize_with = "null_default")]
    pub festivals: Vec<Festival>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Festival {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    pub area: Option<String>,
    pub date: Option<String>,
    pub expected_impact: Option<String>,
}

// ---------------------------------------------------------------------------
// Dashboard summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default, deserialize_with = "null_default")]
    pub total_deliveries: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub delivery_success_rate: f64,
    pub average_delivery_time: Option<AverageTime>,
    #[serde(default, deserialize_with = "null_default")]
    pub failed_deliveries: u64,
    pub failure_by_reason: Option<OrderedCounts>,
    pub delivery_by_area: Option<OrderedCounts>,
    /// Most recent first.
    #[serde(default, deserialize_with = "null_default")]
    pub recent_activities: Vec<Activity>,
    /// Daily success rate for the last week, oldest first.
    pub weekly_success_rate: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AverageTime {
    Minutes(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default, deserialize_with = "null_default")]
    pub action: String,
    #[serde(default, deserialize_with = "null_default")]
    pub time: String,
    #[serde(default, deserialize_with = "null_default")]
    pub details: String,
}

// ---------------------------------------------------------------------------
// Orders and routes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub order_id: String,
    #[serde(default, alias = "name", deserialize_with = "null_default")]
    pub customer_name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_default")]
    pub package_size: String,
    pub area: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizeRequest<'a> {
    pub order_ids: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedRoute {
    #[serde(default, deserialize_with = "null_default")]
    pub total_distance: String,
    #[serde(default, deserialize_with = "null_default")]
    pub total_duration: String,
    #[serde(default, deserialize_with = "null_default")]
    pub legs: Vec<RouteLeg>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    #[serde(default, deserialize_with = "null_default")]
    pub from: String,
    #[serde(default, deserialize_with = "null_default")]
    pub to: String,
    #[serde(default, deserialize_with = "null_default")]
    pub from_address: String,
    #[serde(default, deserialize_with = "null_default")]
    pub to_address: String,
    pub distance: Option<String>,
    pub duration: Option<String>,
    pub traffic_conditions: Option<TrafficConditions>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrafficConditions {
    Light,
    Moderate,
    Heavy,
    #[serde(other)]
    Unknown,
}

impl TrafficConditions {
    pub fn label(self) -> &'static str {
        match self {
            TrafficConditions::Light => "Light",
            TrafficConditions::Moderate => "Moderate",
            TrafficConditions::Heavy => "Heavy",
            TrafficConditions::Unknown => "Unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ordered_counts_keep_payload_order() {
        let counts: OrderedCounts =
            serde_json::from_str(r#"{"Zulu": 3, "Alpha": 1, "Mike": 2}"#).unwrap();
        assert_eq!(counts.keys().collect::<Vec<_>>(), vec!["Zulu", "Alpha", "Mike"]);
        assert_eq!(counts.get("Alpha"), Some(&1));
    }

    #[test]
    fn test_traffic_flat_and_tagged_shapes_agree() {
        let flat: TrafficSnapshot = serde_json::from_value(json!({
            "overall_city_congestion": 6,
            "status": "Busy",
            "Downtown": {"congestion_level": 8, "delay_minutes": 15, "status": "Heavy"},
            "note": "ignored scalar",
            "Harbor": {"congestion_level": 3, "delay_minutes": 2}
        }))
        .unwrap();

        let tagged: TrafficSnapshot = serde_json::from_value(json!({
            "overall_city_congestion": 6,
            "status": "Busy",
            "areas": {
                "Downtown": {"congestion_level": 8, "delay_minutes": 15, "status": "Heavy"},
                "Harbor": {"congestion_level": 3, "delay_minutes": 2}
            }
        }))
        .unwrap();

        assert_eq!(flat, tagged);
        assert_eq!(flat.areas.keys().collect::<Vec<_>>(), vec!["Downtown", "Harbor"]);
        assert_eq!(flat.overall_city_congestion, Some(6.0));
    }

    #[test]
    fn test_temperature_accepts_number_or_object() {
        let bare: Temperature = serde_json::from_value(json!(21.5)).unwrap();
        assert_eq!(bare, Temperature::Celsius(21.5));

        let detailed: Temperature =
            serde_json::from_value(json!({"current": 30, "feels_like": 33})).unwrap();
        assert_eq!(
            detailed,
            Temperature::Detailed { current: 30.0, feels_like: Some(33.0), units: "C".into() }
        );
    }

    #[test]
    fn test_unrecognised_traffic_condition_is_unknown() {
        let leg: RouteLeg = serde_json::from_value(json!({
            "from": "Depot", "to": "Order A", "traffic_conditions": "Gridlock"
        }))
        .unwrap();
        assert_eq!(leg.traffic_conditions, Some(TrafficConditions::Unknown));
    }

    #[test]
    fn test_pending_order_accepts_name_alias() {
        let order: PendingOrder = serde_json::from_value(json!({
            "order_id": "A", "name": "Ada", "area": "North"
        }))
        .unwrap();
        assert_eq!(order.customer_name, "Ada");
    }

    #[test]
    fn test_explicit_nulls_fall_back_to_defaults() {
        let weather: WeatherSnapshot =
            serde_json::from_value(json!({"conditions": null, "humidity": 50})).unwrap();
        assert_eq!(weather.conditions, "");
        assert_eq!(weather.humidity, Some(50.0));

        let summary: DashboardSummary = serde_json::from_value(json!({
            "total_deliveries": null,
            "delivery_success_rate": null,
            "failed_deliveries": 4,
            "recent_activities": [{"action": "Delivered", "time": null, "details": null}]
        }))
        .unwrap();
        assert_eq!(summary.total_deliveries, 0);
        assert_eq!(summary.delivery_success_rate, 0.0);
        assert_eq!(summary.failed_deliveries, 4);
        assert_eq!(summary.recent_activities[0].time, "");
        assert_eq!(summary.recent_activities[0].details, "");

        let order: PendingOrder = serde_json::from_value(json!({
            "order_id": "A", "customer_name": null, "address": null, "package_size": null, "area": "North"
        }))
        .unwrap();
        assert_eq!(order.customer_name, "");

        let route: OptimizedRoute = serde_json::from_value(json!({
            "total_distance": null,
            "legs": [{"from": null, "to": "Order A", "from_address": null, "to_address": null}]
        }))
        .unwrap();
        assert_eq!(route.total_distance, "");
        assert_eq!(route.legs[0].from, "");
        assert_eq!(route.legs[0].to, "Order A");
    }

    #[test]
    fn test_flat_area_with_null_congestion_is_kept() {
        let traffic: TrafficSnapshot = serde_json::from_value(json!({
            "overall_city_congestion": null,
            "Harbor": {"congestion_level": null, "delay_minutes": null},
            "Downtown": {"congestion_level": 7, "delay_minutes": 12}
        }))
        .unwrap();
        assert_eq!(traffic.areas.keys().collect::<Vec<_>>(), vec!["Harbor", "Downtown"]);
        let harbor = traffic.areas.get("Harbor").unwrap();
        assert_eq!(harbor.congestion_level, 0.0);
        assert_eq!(harbor.delay_minutes, 0.0);
        assert_eq!(traffic.overall_city_congestion, None);
    }
}
