// services/dispatch-dash/src/adapter.rs
//
// Data source adapter: runs one backend request per feed and records the
// outcome in the shared store

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use svckit::errors::DashError;
use svckit::metrics::{self, FetchOutcome};
use svckit::types::{Feed, OptimizedRoute};

use crate::api::DeliveryApi;
use crate::store::{DashboardStore, FeedData};

#[derive(Clone)]
pub struct DataSourceAdapter {
    api: Arc<dyn DeliveryApi>,
    store: Arc<DashboardStore>,
}

impl DataSourceAdapter {
    pub fn new(api: Arc<dyn DeliveryApi>, store: Arc<DashboardStore>) -> Self {
        Self { api, store }
    }

    pub fn store(&self) -> &Arc<DashboardStore> {
        &self.store
    }

    pub async fn fetch_weather(&self) {
        let _ = self.track(self.api.fetch_weather()).await;
    }

    pub async fn fetch_traffic(&self) {
        let _ = self.track(self.api.fetch_traffic()).await;
    }

    pub async fn fetch_festivals(&self) {
        let _ = self.track(self.api.fetch_festivals()).await;
    }

    pub async fn fetch_dashboard_summary(&self) {
        let _ = self.track(self.api.fetch_dashboard_summary()).await;
    }

    pub async fn fetch_pending_orders(&self) {
        let _ = self.track(self.api.fetch_pending_orders()).await;
    }

    /// Weather, traffic and festivals, fetched concurrently.
    pub async fn fetch_real_time(&self) {
        tokio::join!(
            self.fetch_weather(),
            self.fetch_traffic(),
            self.fetch_festivals()
        );
    }

    /// Request an optimized route; the result is also stored in the route feed.
    pub async fn optimize_route(&self, order_ids: &[String]) -> Result<OptimizedRoute, DashError> {
        self.track(self.api.optimize_route(order_ids)).await
    }

    pub async fn fetch(&self, feed: Feed) {
        match feed {
            Feed::Weather => self.fetch_weather().await,
            Feed::Traffic => self.fetch_traffic().await,
            Feed::Festivals => self.fetch_festivals().await,
            Feed::Summary => self.fetch_dashboard_summary().await,
            Feed::PendingOrders => self.fetch_pending_orders().await,
            Feed::Route => debug!("Route feed is only fetched through optimize_route"),
        }
    }

    /// Fetch every listed feed concurrently and wait for all of them.
    pub async fn refresh(&self, feeds: &[Feed]) {
        let mut join_set = JoinSet::new();
        for &feed in feeds {
            let adapter = self.clone();
            join_set.spawn(async move { adapter.fetch(feed).await });
        }
        while let Some(joined) = join_set.join_next().await {
            if let Err(e) = joined {
                warn!("Feed refresh task failed: {}", e);
            }
        }
    }

    async fn track<T, F>(&self, request: F) -> Result<T, DashError>
    where
        T: FeedData,
        F: Future<Output = Result<T, DashError>>,
    {
        let feed = T::FEED;
        let epoch = self.store.begin::<T>();
        let start = Instant::now();

        let result = request.await;
        let elapsed = start.elapsed().as_secs_f64();

        let stored = match &result {
            Ok(payload) => Ok(payload.clone()),
            Err(e) => {
                warn!("Failed to fetch {}: {}", feed, e);
                Err(e.to_string())
            }
        };

        let outcome = match self.store.complete::<T>(epoch, stored) {
            Err(_) => FetchOutcome::Stale,
            Ok(()) if result.is_ok() => FetchOutcome::Success,
            Ok(()) => FetchOutcome::Failure,
        };
        metrics::record_fetch(feed, outcome, elapsed);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{adapter_with, StubApi};
    use std::time::Duration;

    #[tokio::test]
    async fn test_fetch_sets_ready() {
        let api = StubApi::new();
        let (adapter, store) = adapter_with(api.clone());

        adapter.fetch_dashboard_summary().await;

        assert_eq!(api.calls(Feed::Summary), 1);
        let total = store.select(|s| s.summary.ready().map(|d| d.total_deliveries));
        assert_eq!(total, Some(42));
    }

    #[tokio::test]
    async fn test_failure_sets_error_message() {
        let api = StubApi::new();
        api.fail(Feed::PendingOrders);
        let (adapter, store) = adapter_with(api);

        adapter.fetch_pending_orders().await;

        let error = store.select(|s| s.orders.error().map(str::to_owned));
        assert_eq!(
            error.as_deref(),
            Some("Network error: pending_orders backend unavailable")
        );
    }

    #[tokio::test]
    async fn test_one_failing_feed_does_not_block_siblings() {
        let api = StubApi::new();
        api.fail(Feed::Traffic);
        let (adapter, store) = adapter_with(api.clone());

        adapter.fetch_real_time().await;

        let snapshot = store.snapshot();
        assert!(snapshot.is_ready(Feed::Weather));
        assert!(snapshot.error(Feed::Traffic).is_some());
        assert!(snapshot.is_ready(Feed::Festivals));
        assert!(snapshot.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_refresh_skips_route_feed() {
        let api = StubApi::new();
        let (adapter, _store) = adapter_with(api.clone());

        adapter.refresh(&[Feed::Summary, Feed::Route, Feed::PendingOrders]).await;

        assert_eq!(api.calls(Feed::Summary), 1);
        assert_eq!(api.calls(Feed::PendingOrders), 1);
        assert_eq!(api.calls(Feed::Route), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_request_wins_even_if_it_resolves_first() {
        let api = StubApi::new();
        api.delay_weather([Duration::from_secs(10), Duration::from_secs(1)]);
        let (adapter, store) = adapter_with(api.clone());

        let slow = tokio::spawn({
            let adapter = adapter.clone();
            async move { adapter.fetch_weather().await }
        });
        tokio::task::yield_now().await;
        let fast = tokio::spawn({
            let adapter = adapter.clone();
            async move { adapter.fetch_weather().await }
        });

        fast.await.unwrap();
        slow.await.unwrap();

        let conditions = store.select(|s| s.weather.ready().map(|w| w.conditions.clone()));
        assert_eq!(conditions.as_deref(), Some("Clear, call 2"));
    }

    #[tokio::test]
    async fn test_optimize_route_stores_and_returns_route() {
        let api = StubApi::new();
        let (adapter, store) = adapter_with(api.clone());
        let ids = vec!["A".to_string(), "C".to_string()];

        let route = adapter.optimize_route(&ids).await.unwrap();

        assert_eq!(route.legs.len(), 2);
        assert_eq!(store.select(|s| s.route.ready().cloned()), Some(route));
        assert_eq!(api.optimized.lock().as_slice(), &[ids]);
    }
}
