// services/dispatch-dash/src/poller.rs
//
// Polling coordinator: initial fetch on mount, recurring refresh of the
// real-time feeds, cancellation on unmount

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use svckit::metrics::ACTIVE_POLLERS;
use svckit::types::Feed;

use crate::adapter::DataSourceAdapter;

/// Feeds a screen fetches at mount, on every tick, and on manual refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPlan {
    pub initial: Vec<Feed>,
    pub recurring: Vec<Feed>,
    pub refresh: Vec<Feed>,
}

impl PollPlan {
    /// Summary plus real-time feeds at mount; only real-time feeds re-poll.
    pub fn dashboard() -> Self {
        let mut all = vec![Feed::Summary];
        all.extend(Feed::REAL_TIME);
        Self {
            initial: all.clone(),
            recurring: Feed::REAL_TIME.to_vec(),
            refresh: all,
        }
    }

    /// Pending orders at mount, real-time feeds only if nothing is loaded yet.
    pub fn route(real_time_loaded: bool) -> Self {
        let mut initial = vec![Feed::PendingOrders];
        if !real_time_loaded {
            initial.extend(Feed::REAL_TIME);
        }
        let mut refresh = vec![Feed::PendingOrders];
        refresh.extend(Feed::REAL_TIME);
        Self {
            initial,
            recurring: Vec::new(),
            refresh,
        }
    }
}

pub struct Poller;

impl Poller {
    /// Must be called inside a tokio runtime.
    pub fn mount(adapter: DataSourceAdapter, plan: PollPlan, period: Duration) -> PollHandle {
        let PollPlan {
            initial,
            recurring,
            refresh,
        } = plan;
        let active = Arc::new(AtomicBool::new(true));

        info!("Mounting poller: {} initial feeds, period {:?}", initial.len(), period);
        spawn_refresh(&adapter, &active, initial);

        let timer = if recurring.is_empty() || period.is_zero() {
            None
        } else {
            let adapter = adapter.clone();
            let active = active.clone();
            Some(tokio::spawn(async move {
                let mut ticker = time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if !active.load(Ordering::SeqCst) {
                        break;
                    }
                    debug!("Poll tick: refreshing {} feeds", recurring.len());
                    spawn_refresh(&adapter, &active, recurring.clone());
                }
            }))
        };

        ACTIVE_POLLERS.inc();

        PollHandle {
            adapter,
            refresh,
            active,
            timer,
        }
    }
}

/// The flag is re-read inside the task so a refresh queued just before
/// unmount never reaches the adapter.
fn spawn_refresh(adapter: &DataSourceAdapter, active: &Arc<AtomicBool>, feeds: Vec<Feed>) {
    if feeds.is_empty() {
        return;
    }
    let adapter = adapter.clone();
    let active = active.clone();
    tokio::spawn(async move {
        if !active.load(Ordering::SeqCst) {
            debug!("Poller unmounted, skipping refresh of {} feeds", feeds.len());
            return;
        }
        adapter.refresh(&feeds).await
    });
}

/// Owns the recurring timer; dropping the handle cancels it.
pub struct PollHandle {
    adapter: DataSourceAdapter,
    refresh: Vec<Feed>,
    active: Arc<AtomicBool>,
    timer: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Re-fetch the refresh feeds now; the timer keeps its phase.
    pub fn refresh_now(&self) {
        if !self.active.load(Ordering::SeqCst) {
            return;
        }
        spawn_refresh(&self.adapter, &self.active, self.refresh.clone());
    }

    pub fn is_polling(&self) -> bool {
        self.active.load(Ordering::SeqCst)
            && self.timer.as_ref().map_or(false, |timer| !timer.is_finished())
    }

    pub fn adapter(&self) -> &DataSourceAdapter {
        &self.adapter
    }

    pub fn unmount(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
        ACTIVE_POLLERS.dec();
        info!("Poller unmounted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FeedState;
    use crate::testing::{adapter_with, settle, StubApi};

    const PERIOD: Duration = Duration::from_secs(5 * 60);

    #[tokio::test(start_paused = true)]
    async fn test_mount_fetches_initial_feeds_once() {
        let api = StubApi::new();
        let (adapter, _store) = adapter_with(api.clone());

        let handle = Poller::mount(adapter, PollPlan::dashboard(), PERIOD);
        settle().await;

        for feed in [Feed::Summary, Feed::Weather, Feed::Traffic, Feed::Festivals] {
            assert_eq!(api.calls(feed), 1, "{}", feed);
        }
        assert_eq!(api.calls(Feed::PendingOrders), 0);
        assert!(handle.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_refreshes_only_real_time_feeds() {
        let api = StubApi::new();
        let (adapter, _store) = adapter_with(api.clone());
        let _handle = Poller::mount(adapter, PollPlan::dashboard(), PERIOD);
        settle().await;

        time::advance(PERIOD).await;
        settle().await;

        assert_eq!(api.calls(Feed::Weather), 2);
        assert_eq!(api.calls(Feed::Traffic), 2);
        assert_eq!(api.calls(Feed::Festivals), 2);
        assert_eq!(api.calls(Feed::Summary), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_stops_future_fetches() {
        let api = StubApi::new();
        let (adapter, _store) = adapter_with(api.clone());

        let handle = Poller::mount(adapter, PollPlan::dashboard(), PERIOD);
        settle().await;
        handle.unmount();

        time::advance(PERIOD * 3).await;
        settle().await;

        assert_eq!(api.calls(Feed::Weather), 1);
        assert_eq!(api.calls(Feed::Summary), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_queued_before_unmount_is_skipped() {
        let api = StubApi::new();
        let (adapter, store) = adapter_with(api.clone());

        // Neither the initial fetch nor the manual refresh has run yet.
        let handle = Poller::mount(adapter, PollPlan::dashboard(), PERIOD);
        handle.refresh_now();
        handle.unmount();
        settle().await;

        for feed in [Feed::Summary, Feed::Weather, Feed::Traffic, Feed::Festivals] {
            assert_eq!(api.calls(feed), 0, "{}", feed);
        }
        assert_eq!(store.snapshot().weather, FeedState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timer() {
        let api = StubApi::new();
        let (adapter, _store) = adapter_with(api.clone());
        {
            let _handle = Poller::mount(adapter, PollPlan::dashboard(), PERIOD);
            settle().await;
        }

        time::advance(PERIOD * 2).await;
        settle().await;
        assert_eq!(api.calls(Feed::Traffic), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_now_keeps_timer_phase() {
        let api = StubApi::new();
        let (adapter, _store) = adapter_with(api.clone());
        let handle = Poller::mount(adapter, PollPlan::dashboard(), PERIOD);
        settle().await;

        time::advance(Duration::from_secs(3 * 60)).await;
        handle.refresh_now();
        settle().await;
        assert_eq!(api.calls(Feed::Weather), 2);
        assert_eq!(api.calls(Feed::Summary), 2);

        time::advance(Duration::from_secs(2 * 60)).await;
        settle().await;
        assert_eq!(api.calls(Feed::Weather), 3);
        assert_eq!(api.calls(Feed::Summary), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_route_plan_has_no_timer() {
        let api = StubApi::new();
        let (adapter, _store) = adapter_with(api.clone());

        let handle = Poller::mount(adapter, PollPlan::route(true), PERIOD);
        settle().await;

        assert_eq!(api.calls(Feed::PendingOrders), 1);
        assert_eq!(api.calls(Feed::Weather), 0);
        assert!(!handle.is_polling());

        handle.refresh_now();
        settle().await;
        assert_eq!(api.calls(Feed::PendingOrders), 2);
        assert_eq!(api.calls(Feed::Weather), 1);
    }

    #[test]
    fn test_route_plan_loads_real_time_when_missing() {
        let plan = PollPlan::route(false);
        assert_eq!(
            plan.initial,
            vec![Feed::PendingOrders, Feed::Weather, Feed::Traffic, Feed::Festivals]
        );
        assert!(plan.recurring.is_empty());
    }
}
