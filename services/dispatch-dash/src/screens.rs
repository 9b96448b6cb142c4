// services/dispatch-dash/src/screens.rs
//
// Dashboard and route screens: mount/unmount lifecycle plus the derived
// view each one renders from a store snapshot

use chrono::{DateTime, Local};
use tracing::{info, warn};

use svckit::config::{DashboardConfig, DisplayConfig};
use svckit::errors::DashError;
use svckit::types::{
    Feed, FestivalSnapshot, OptimizedRoute, OrderedMap, PendingOrder, TrafficSnapshot,
    WeatherSnapshot,
};

use crate::adapter::DataSourceAdapter;
use crate::poller::{PollHandle, PollPlan, Poller};
use crate::selection::{group_by_area, OrderSelection};
use crate::status::{FeedView, ScreenStatus, StatusPolicy};
use crate::store::{LogLevel, StoreSnapshot};
use crate::transform::{
    classify_condition, format_distance_duration, rank_top_congested, recent_activity_view,
    summary_cards, to_bar_series, to_pie_series, to_trend_series, traffic_trend, ActivityRow,
    BarSeries, PieSeries, RankedArea, SummaryCards, Trend, TrendSeries, WeatherCondition,
};

pub struct DashboardScreen {
    poll: PollHandle,
    policy: StatusPolicy,
    display: DisplayConfig,
}

pub struct DashboardView<'a> {
    pub status: ScreenStatus,
    pub cards: SummaryCards,
    pub failures: PieSeries,
    pub by_area: BarSeries,
    pub trend: TrendSeries,
    pub recent: Vec<ActivityRow>,
    pub weather: FeedView<'a, WeatherSnapshot>,
    pub condition: Option<WeatherCondition>,
    pub traffic: FeedView<'a, TrafficSnapshot>,
    pub top_congested: Vec<RankedArea>,
    pub congestion_trend: Trend,
    pub festivals: FeedView<'a, FestivalSnapshot>,
    pub last_updated: Option<DateTime<Local>>,
}

impl DashboardScreen {
    pub fn mount(adapter: DataSourceAdapter, config: &DashboardConfig) -> Self {
        info!("Mounting dashboard screen");
        Self {
            poll: Poller::mount(adapter, PollPlan::dashboard(), config.refresh.interval()),
            policy: StatusPolicy::dashboard(&config.display),
            display: config.display.clone(),
        }
    }

    pub fn refresh(&self) {
        self.poll
            .adapter()
            .store()
            .log(LogLevel::Info, "Manual dashboard refresh");
        self.poll.refresh_now();
    }

    pub fn view<'a>(&self, snapshot: &'a StoreSnapshot) -> DashboardView<'a> {
        let summary = snapshot.summary.ready();
        let traffic = snapshot.traffic.ready();

        DashboardView {
            status: ScreenStatus::combine(snapshot, &self.policy),
            cards: summary_cards(summary),
            failures: to_pie_series(summary.and_then(|s| s.failure_by_reason.as_ref())),
            by_area: to_bar_series(summary.and_then(|s| s.delivery_by_area.as_ref())),
            trend: to_trend_series(summary.and_then(|s| s.weekly_success_rate.as_deref())),
            recent: summary
                .map(|s| recent_activity_view(&s.recent_activities, self.display.recent_activity_limit))
                .unwrap_or_default(),
            weather: snapshot.weather.view(),
            condition: snapshot
                .weather
                .ready()
                .map(|w| classify_condition(&w.conditions)),
            traffic: snapshot.traffic.view(),
            top_congested: traffic
                .map(|t| rank_top_congested(t, self.display.top_congested))
                .unwrap_or_default(),
            congestion_trend: traffic_trend(
                snapshot.previous_congestion,
                traffic.and_then(|t| t.overall_city_congestion),
            ),
            festivals: snapshot.festivals.view(),
            last_updated: snapshot.last_updated,
        }
    }

    pub fn unmount(self) {
        info!("Unmounting dashboard screen");
        self.poll.unmount();
    }
}

/// One row of the optimized route table.
#[derive(Debug, Clone, PartialEq)]
pub struct LegRow {
    pub from: String,
    pub to: String,
    pub from_address: String,
    pub to_address: String,
    pub distance_duration: String,
    pub traffic: &'static str,
}

pub struct RouteView<'a> {
    pub status: ScreenStatus,
    pub orders: FeedView<'a, Vec<PendingOrder>>,
    pub groups: OrderedMap<Vec<PendingOrder>>,
    pub selected_ids: Vec<String>,
    pub selected_count: usize,
    pub toggle_all_label: &'static str,
    pub can_optimize: bool,
    pub show_map: bool,
    pub route: FeedView<'a, OptimizedRoute>,
    pub legs: Vec<LegRow>,
}

pub struct RouteScreen {
    poll: PollHandle,
    policy: StatusPolicy,
    selection: OrderSelection,
    show_map: bool,
}

impl RouteScreen {
    pub fn mount(adapter: DataSourceAdapter, config: &DashboardConfig) -> Self {
        let real_time_loaded = adapter
            .store()
            .select(|s| Feed::REAL_TIME.iter().all(|&feed| s.is_ready(feed)));
        info!("Mounting route screen (real-time loaded: {})", real_time_loaded);

        let mut screen = Self {
            poll: Poller::mount(adapter, PollPlan::route(real_time_loaded), config.refresh.interval()),
            policy: StatusPolicy::route(&config.display),
            selection: OrderSelection::default(),
            show_map: false,
        };
        screen.reconcile();
        screen
    }

    fn adapter(&self) -> &DataSourceAdapter {
        self.poll.adapter()
    }

    /// Sync the selection with the latest pending-order list.
    pub fn reconcile(&mut self) {
        let orders = self
            .adapter()
            .store()
            .select(|s| s.orders.ready().cloned());
        if let Some(orders) = orders {
            self.selection.retain_known(&orders);
        }
    }

    pub fn selection(&self) -> &OrderSelection {
        &self.selection
    }

    pub fn toggle(&mut self, order_id: &str) -> Result<bool, DashError> {
        self.selection.toggle(order_id)
    }

    pub fn toggle_all(&mut self) {
        self.selection.toggle_all();
    }

    pub fn can_optimize(&self) -> bool {
        !self.selection.is_empty() && !self.adapter().store().select(|s| s.route.is_loading())
    }

    /// Selected ids to optimize, or `EmptySelection` if nothing is picked.
    pub fn begin_optimization(&self) -> Result<Vec<String>, DashError> {
        if self.selection.is_empty() {
            return Err(DashError::EmptySelection);
        }
        Ok(self.selection.selected().to_vec())
    }

    /// Apply an optimization outcome: show the map and clear the picks on success.
    pub fn finish_optimization(&mut self, result: &Result<OptimizedRoute, DashError>) {
        match result {
            Ok(route) => {
                self.adapter().store().log(
                    LogLevel::Info,
                    format!("Route optimized: {} stops, {}", route.legs.len(), route.total_distance),
                );
                self.show_map = true;
                self.selection.deselect_all();
            }
            Err(e) => warn!("Route optimization failed: {}", e),
        }
    }

    pub async fn request_optimization(&mut self) -> Result<OptimizedRoute, DashError> {
        let order_ids = self.begin_optimization()?;
        let result = self.adapter().optimize_route(&order_ids).await;
        self.finish_optimization(&result);
        result
    }

    pub fn show_map(&self) -> bool {
        self.show_map
    }

    pub fn toggle_map(&mut self) {
        self.show_map = !self.show_map;
    }

    pub fn refresh(&self) {
        self.adapter()
            .store()
            .log(LogLevel::Info, "Manual route refresh");
        self.poll.refresh_now();
    }

    pub fn view<'a>(&self, snapshot: &'a StoreSnapshot) -> RouteView<'a> {
        let legs = snapshot
            .route
            .ready()
            .map(|route| {
                route
                    .legs
                    .iter()
                    .map(|leg| LegRow {
                        from: leg.from.clone(),
                        to: leg.to.clone(),
                        from_address: leg.from_address.clone(),
                        to_address: leg.to_address.clone(),
                        distance_duration: format_distance_duration(
                            leg.distance.as_deref(),
                            leg.duration.as_deref(),
                        ),
                        traffic: leg.traffic_conditions.map_or("Unknown", |t| t.label()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        RouteView {
            status: ScreenStatus::combine(snapshot, &self.policy),
            orders: snapshot.orders.view(),
            groups: snapshot
                .orders
                .ready()
                .map(|orders| group_by_area(orders))
                .unwrap_or_default(),
            selected_ids: self.selection.selected().to_vec(),
            selected_count: self.selection.len(),
            toggle_all_label: self.selection.toggle_all_label(),
            can_optimize: !self.selection.is_empty() && !snapshot.route.is_loading(),
            show_map: self.show_map,
            route: snapshot.route.view(),
            legs,
        }
    }

    pub fn unmount(self) {
        info!("Unmounting route screen");
        self.poll.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{adapter_with, order, settle, StubApi};
    use svckit::types::TrafficConditions;

    fn config() -> DashboardConfig {
        DashboardConfig::default()
    }

    #[tokio::test]
    async fn test_dashboard_view_after_mount() {
        let api = StubApi::new();
        let (adapter, store) = adapter_with(api.clone());

        let screen = DashboardScreen::mount(adapter, &config());
        settle().await;

        let snapshot = store.snapshot();
        let view = screen.view(&snapshot);
        assert_eq!(view.status, ScreenStatus::default());
        assert_eq!(view.cards.total_deliveries, 42);
        assert_eq!(view.failures.labels, vec!["No Data"]);
        assert!(view.trend.placeholder);
        assert_eq!(view.condition, Some(WeatherCondition::Sunny));
        let names: Vec<&str> = view.top_congested.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Downtown", "Old Town", "Airport"]);
        assert!(view.last_updated.is_some());

        screen.unmount();
    }

    #[tokio::test]
    async fn test_dashboard_banner_leaves_other_cards_rendering() {
        let api = StubApi::new();
        api.fail(Feed::Summary);
        let (adapter, store) = adapter_with(api.clone());

        let screen = DashboardScreen::mount(adapter, &config());
        settle().await;

        let snapshot = store.snapshot();
        let view = screen.view(&snapshot);
        assert_eq!(
            view.status.error.as_deref(),
            Some("Network error: summary backend unavailable")
        );
        assert!(matches!(view.weather, FeedView::Content(_)));
        assert!(matches!(view.traffic, FeedView::Content(_)));
        assert_eq!(view.cards.success_rate, "0%");
    }

    #[tokio::test]
    async fn test_route_mount_skips_loaded_real_time_feeds() {
        let api = StubApi::new();
        let (adapter, _store) = adapter_with(api.clone());
        adapter.fetch_real_time().await;

        let screen = RouteScreen::mount(adapter, &config());
        settle().await;

        assert_eq!(api.calls(Feed::PendingOrders), 1);
        assert_eq!(api.calls(Feed::Weather), 1);
        screen.unmount();
    }

    #[tokio::test]
    async fn test_route_mount_loads_missing_real_time_feeds() {
        let api = StubApi::new();
        let (adapter, _store) = adapter_with(api.clone());

        let _screen = RouteScreen::mount(adapter, &config());
        settle().await;

        assert_eq!(api.calls(Feed::Weather), 1);
        assert_eq!(api.calls(Feed::Festivals), 1);
    }

    #[tokio::test]
    async fn test_optimization_requires_selection() {
        let api = StubApi::new();
        let (adapter, _store) = adapter_with(api.clone());
        let mut screen = RouteScreen::mount(adapter, &config());
        settle().await;
        screen.reconcile();

        assert!(!screen.can_optimize());
        let err = screen.request_optimization().await.unwrap_err();
        assert!(matches!(err, DashError::EmptySelection));
        assert_eq!(api.calls(Feed::Route), 0);
        assert!(!screen.show_map());
    }

    #[tokio::test]
    async fn test_successful_optimization_shows_map_and_clears_selection() {
        let api = StubApi::new();
        let (adapter, store) = adapter_with(api.clone());
        let mut screen = RouteScreen::mount(adapter, &config());
        settle().await;
        screen.reconcile();

        screen.toggle("C").unwrap();
        screen.toggle("A").unwrap();
        assert!(screen.can_optimize());

        let route = screen.request_optimization().await.unwrap();
        assert_eq!(route.legs.len(), 2);
        assert!(screen.show_map());
        assert!(screen.selection().is_empty());
        assert_eq!(
            api.optimized.lock().clone(),
            vec![vec!["C".to_string(), "A".to_string()]]
        );

        let snapshot = store.snapshot();
        let view = screen.view(&snapshot);
        assert_eq!(view.legs[0].to, "C");
        assert_eq!(view.legs[0].distance_duration, "2.4 km (9 min)");
        assert_eq!(view.legs[0].traffic, TrafficConditions::Moderate.label());
    }

    #[tokio::test]
    async fn test_failed_optimization_keeps_selection() {
        let api = StubApi::new();
        api.fail(Feed::Route);
        let (adapter, store) = adapter_with(api.clone());
        let mut screen = RouteScreen::mount(adapter, &config());
        settle().await;
        screen.reconcile();
        screen.toggle("B").unwrap();

        assert!(screen.request_optimization().await.is_err());
        assert!(!screen.show_map());
        assert_eq!(screen.selection().selected(), ["B"]);

        let snapshot = store.snapshot();
        let view = screen.view(&snapshot);
        assert_eq!(
            view.status.error.as_deref(),
            Some("Network error: route backend unavailable")
        );
    }

    #[tokio::test]
    async fn test_reconcile_after_reload_drops_vanished_orders() {
        let api = StubApi::new();
        let (adapter, _store) = adapter_with(api.clone());
        let mut screen = RouteScreen::mount(adapter, &config());
        settle().await;
        screen.reconcile();
        screen.toggle_all();
        assert_eq!(screen.view(&StoreSnapshot::default()).toggle_all_label, "Deselect All");

        api.set_orders(vec![order("B", "North"), order("D", "West")]);
        screen.refresh();
        settle().await;
        screen.reconcile();

        assert_eq!(screen.selection().selected(), ["B"]);
    }
}
