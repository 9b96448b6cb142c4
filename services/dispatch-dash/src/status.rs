// services/dispatch-dash/src/status.rs
//
// Screen-level loading/error state derived from the per-feed states

use svckit::config::DisplayConfig;
use svckit::types::Feed;

use crate::store::{FeedState, StoreSnapshot};

/// Which feeds a screen watches, in error-priority order.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusPolicy {
    pub feeds: Vec<Feed>,
    /// The banner is hidden while this feed is ready.
    pub suppress_when_ready: Option<Feed>,
}

impl StatusPolicy {
    pub fn dashboard(display: &DisplayConfig) -> Self {
        Self {
            feeds: display.dashboard_error_priority.clone(),
            suppress_when_ready: None,
        }
    }

    pub fn route(display: &DisplayConfig) -> Self {
        Self {
            feeds: display.route_error_priority.clone(),
            suppress_when_ready: Some(Feed::Route),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenStatus {
    pub loading: bool,
    pub error: Option<String>,
}

impl ScreenStatus {
    pub fn combine(snapshot: &StoreSnapshot, policy: &StatusPolicy) -> Self {
        let loading = policy.feeds.iter().any(|&feed| snapshot.is_loading(feed));

        let suppressed = policy
            .suppress_when_ready
            .map_or(false, |feed| snapshot.is_ready(feed));
        let error = if suppressed {
            None
        } else {
            policy
                .feeds
                .iter()
                .find_map(|&feed| snapshot.error(feed))
                .map(str::to_owned)
        };

        Self { loading, error }
    }
}

/// How a single card renders its feed.
#[derive(Debug, PartialEq)]
pub enum FeedView<'a, T> {
    Pending,
    Spinner,
    Content(&'a T),
    Unavailable(&'a str),
}

impl<T> FeedState<T> {
    pub fn view(&self) -> FeedView<'_, T> {
        match self {
            FeedState::Idle => FeedView::Pending,
            FeedState::Loading => FeedView::Spinner,
            FeedState::Ready(payload) => FeedView::Content(payload),
            FeedState::Error(message) => FeedView::Unavailable(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_route, sample_weather};
    use svckit::types::{DashboardSummary, OptimizedRoute, WeatherSnapshot};

    fn display() -> DisplayConfig {
        DisplayConfig::default()
    }

    #[test]
    fn test_loading_is_or_over_feeds() {
        let mut snapshot = StoreSnapshot::default();
        let policy = StatusPolicy::dashboard(&display());
        assert!(!ScreenStatus::combine(&snapshot, &policy).loading);

        snapshot.festivals = FeedState::Loading;
        assert!(ScreenStatus::combine(&snapshot, &policy).loading);
    }

    #[test]
    fn test_error_follows_priority() {
        let mut snapshot = StoreSnapshot::default();
        snapshot.traffic = FeedState::Error("traffic down".into());
        snapshot.summary = FeedState::Error("summary down".into());
        snapshot.weather = FeedState::Ready(sample_weather("Sunny"));

        let status = ScreenStatus::combine(&snapshot, &StatusPolicy::dashboard(&display()));
        assert_eq!(status.error.as_deref(), Some("summary down"));
        assert!(!status.loading);
    }

    #[test]
    fn test_dashboard_ignores_route_feeds() {
        let mut snapshot = StoreSnapshot::default();
        snapshot.orders = FeedState::Error("orders down".into());
        snapshot.summary = FeedState::Ready(DashboardSummary::default());

        let status = ScreenStatus::combine(&snapshot, &StatusPolicy::dashboard(&display()));
        assert_eq!(status.error, None);
    }

    #[test]
    fn test_route_banner_hidden_once_route_ready() {
        let mut snapshot = StoreSnapshot::default();
        snapshot.weather = FeedState::Error("weather down".into());
        let policy = StatusPolicy::route(&display());
        assert_eq!(
            ScreenStatus::combine(&snapshot, &policy).error.as_deref(),
            Some("weather down")
        );

        snapshot.route = FeedState::Ready(sample_route(&["A".to_string()]));
        assert_eq!(ScreenStatus::combine(&snapshot, &policy).error, None);
    }

    #[test]
    fn test_feed_view_per_state() {
        let weather = sample_weather("Rain");
        assert_eq!(FeedState::<WeatherSnapshot>::Idle.view(), FeedView::Pending);
        assert_eq!(FeedState::<WeatherSnapshot>::Loading.view(), FeedView::Spinner);
        assert_eq!(
            FeedState::Ready(weather.clone()).view(),
            FeedView::Content(&weather)
        );
        let failed: FeedState<OptimizedRoute> = FeedState::Error("boom".into());
        assert_eq!(failed.view(), FeedView::Unavailable("boom"));
    }
}
