// services/dispatch-dash/src/transform.rs
//
// Pure conversions from feed payloads to chart and card shapes.
// Every function has a defined result for absent input.

use svckit::types::{
    Activity, AverageTime, DashboardSummary, OrderedCounts, Temperature, TrafficSnapshot, Wind,
    OVERALL_CONGESTION_KEY, STATUS_KEY,
};

pub const NO_DATA_LABEL: &str = "No Data";
pub const NO_DATA_COLOR: &str = "#e0e0e0";

pub const PIE_PALETTE: [&str; 5] = [
    "rgba(255, 99, 132, 0.7)",
    "rgba(54, 162, 235, 0.7)",
    "rgba(255, 206, 86, 0.7)",
    "rgba(75, 192, 192, 0.7)",
    "rgba(153, 102, 255, 0.7)",
];

pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Shown when the backend does not send a weekly success-rate history.
pub const PLACEHOLDER_TREND: [f64; 7] = [85.0, 87.0, 89.0, 92.0, 86.0, 90.0, 88.0];

#[derive(Debug, Clone, PartialEq)]
pub struct PieSeries {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
    pub colors: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BarSeries {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendSeries {
    pub labels: [&'static str; 7],
    pub values: [f64; 7],
    /// True when `values` is the fixed placeholder rather than backend history.
    pub placeholder: bool,
}

pub fn to_pie_series(failure_by_reason: Option<&OrderedCounts>) -> PieSeries {
    match failure_by_reason {
        Some(counts) if !counts.is_empty() => PieSeries {
            labels: counts.keys().map(str::to_owned).collect(),
            values: counts.values().copied().collect(),
            colors: (0..counts.len())
                .map(|i| PIE_PALETTE[i % PIE_PALETTE.len()])
                .collect(),
        },
        _ => PieSeries {
            labels: vec![NO_DATA_LABEL.to_string()],
            values: vec![100],
            colors: vec![NO_DATA_COLOR],
        },
    }
}

pub fn to_bar_series(delivery_by_area: Option<&OrderedCounts>) -> BarSeries {
    match delivery_by_area {
        Some(counts) => BarSeries {
            labels: counts.keys().map(str::to_owned).collect(),
            values: counts.values().copied().collect(),
        },
        None => BarSeries::default(),
    }
}

pub fn to_trend_series(history: Option<&[f64]>) -> TrendSeries {
    let history = match history {
        Some(values) if !values.is_empty() => values,
        _ => {
            return TrendSeries {
                labels: WEEKDAY_LABELS,
                values: PLACEHOLDER_TREND,
                placeholder: true,
            }
        }
    };

    let recent = &history[history.len().saturating_sub(7)..];
    let pad = 7 - recent.len();
    let mut values = [recent[0]; 7];
    values[pad..].copy_from_slice(recent);

    TrendSeries {
        labels: WEEKDAY_LABELS,
        values,
        placeholder: false,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedArea {
    pub name: String,
    pub congestion_level: f64,
    pub delay_minutes: f64,
    pub status: Option<String>,
}

/// The `n` most congested areas, highest first; ties keep payload order.
pub fn rank_top_congested(traffic: &TrafficSnapshot, n: usize) -> Vec<RankedArea> {
    let mut areas: Vec<RankedArea> = traffic
        .areas
        .iter()
        .filter(|(name, _)| *name != OVERALL_CONGESTION_KEY && *name != STATUS_KEY)
        .map(|(name, info)| RankedArea {
            name: name.to_string(),
            congestion_level: info.congestion_level,
            delay_minutes: info.delay_minutes,
            status: info.status.clone(),
        })
        .collect();

    areas.sort_by(|a, b| b.congestion_level.total_cmp(&a.congestion_level));
    areas.truncate(n);
    areas
}

/// Congestion label used on the traffic card.
pub fn traffic_label(level: f64) -> &'static str {
    if level < 4.0 {
        "Light"
    } else if level < 7.0 {
        "Moderate"
    } else if level < 9.0 {
        "Heavy"
    } else {
        "Severe"
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trend {
    Up(f64),
    Down(f64),
    Flat,
}

/// City-wide level shown when the feed omits `overall_city_congestion`.
pub const DEFAULT_CONGESTION: f64 = 5.0;

pub fn overall_congestion(traffic: &TrafficSnapshot) -> f64 {
    traffic.overall_city_congestion.unwrap_or(DEFAULT_CONGESTION)
}

/// Percentage change in overall congestion since the previous snapshot.
pub fn traffic_trend(previous: Option<f64>, current: Option<f64>) -> Trend {
    match (previous, current) {
        (Some(prev), Some(cur)) if prev > 0.0 => {
            let change = (cur - prev) / prev * 100.0;
            if change.abs() < 0.5 {
                Trend::Flat
            } else if change > 0.0 {
                Trend::Up(change)
            } else {
                Trend::Down(-change)
            }
        }
        _ => Trend::Flat,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherCondition {
    Sunny,
    Rain,
    Cloud,
    Snow,
    Storm,
    Haze,
    Other,
}

const CONDITION_KEYWORDS: [(WeatherCondition, &[&str]); 6] = [
    (WeatherCondition::Sunny, &["sun", "clear"]),
    (WeatherCondition::Rain, &["rain", "drizzle"]),
    (WeatherCondition::Cloud, &["cloud"]),
    (WeatherCondition::Snow, &["snow"]),
    (WeatherCondition::Storm, &["thunder", "storm"]),
    (WeatherCondition::Haze, &["fog", "haze", "mist"]),
];

pub fn classify_condition(text: &str) -> WeatherCondition {
    let lower = text.to_lowercase();
    CONDITION_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(condition, _)| *condition)
        .unwrap_or(WeatherCondition::Other)
}

/// `125 -> "2h 5m"`, `45 -> "45 min"`. Negative or non-finite input reads as zero.
pub fn format_duration(total_minutes: f64) -> String {
    let minutes = if total_minutes.is_finite() && total_minutes > 0.0 {
        total_minutes
    } else {
        0.0
    };

    let mut hours = (minutes / 60.0).floor() as u64;
    let mut mins = (minutes % 60.0).round() as u64;
    if mins == 60 {
        hours += 1;
        mins = 0;
    }

    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{} min", mins)
    }
}

pub fn format_temperature(temperature: Option<&Temperature>) -> String {
    match temperature {
        Some(Temperature::Detailed { current, units, .. }) => format!("{}°{}", current, units),
        Some(Temperature::Celsius(value)) => format!("{}°C", value),
        None => "N/A".to_string(),
    }
}

pub fn format_humidity(humidity: Option<f64>) -> String {
    match humidity {
        Some(value) => format!("{}%", value),
        None => "N/A".to_string(),
    }
}

pub fn format_wind(wind: Option<&Wind>) -> String {
    match wind.and_then(|w| w.speed) {
        Some(speed) => format!("{} km/h", speed),
        None => "N/A".to_string(),
    }
}

pub fn format_distance_duration(distance: Option<&str>, duration: Option<&str>) -> String {
    if distance.is_none() && duration.is_none() {
        return "-".to_string();
    }
    format!("{} ({})", distance.unwrap_or("?"), duration.unwrap_or("?"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryCards {
    pub total_deliveries: u64,
    pub success_rate: String,
    pub average_time: String,
    pub failed_deliveries: u64,
}

pub fn summary_cards(summary: Option<&DashboardSummary>) -> SummaryCards {
    let Some(summary) = summary else {
        return SummaryCards {
            total_deliveries: 0,
            success_rate: "0%".to_string(),
            average_time: format_duration(0.0),
            failed_deliveries: 0,
        };
    };

    let average_time = match &summary.average_delivery_time {
        Some(AverageTime::Minutes(minutes)) => format_duration(*minutes),
        Some(AverageTime::Text(text)) if !text.trim().is_empty() => text.clone(),
        _ => format_duration(0.0),
    };

    SummaryCards {
        total_deliveries: summary.total_deliveries,
        success_rate: format!("{}%", summary.delivery_success_rate),
        average_time,
        failed_deliveries: summary.failed_deliveries,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Delivery,
    FailedDelivery,
    RouteOptimized,
    WeatherAlert,
    Other,
}

impl ActivityKind {
    pub fn classify(action: &str) -> Self {
        match action {
            "Delivery" => ActivityKind::Delivery,
            "Failed Delivery" => ActivityKind::FailedDelivery,
            "Route Optimized" => ActivityKind::RouteOptimized,
            "Weather Alert" => ActivityKind::WeatherAlert,
            _ => ActivityKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRow {
    pub kind: ActivityKind,
    pub action: String,
    pub time: String,
    pub details: String,
}

/// Most recent activities first, at most `limit` of them.
pub fn recent_activity_view(activities: &[Activity], limit: usize) -> Vec<ActivityRow> {
    activities
        .iter()
        .take(limit)
        .map(|a| ActivityRow {
            kind: ActivityKind::classify(&a.action),
            action: a.action.clone(),
            time: a.time.clone(),
            details: a.details.clone(),
        })
        .collect()
}
