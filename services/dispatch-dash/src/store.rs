// services/dispatch-dash/src/store.rs
//
// Shared dashboard store: one feed slot per data source, published through a
// watch channel so every mounted screen sees the same state.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local};
use tokio::sync::watch;
use tracing::debug;

use svckit::errors::DashError;
use svckit::types::{
    DashboardSummary, Feed, FestivalSnapshot, OptimizedRoute, PendingOrder, TrafficSnapshot,
    WeatherSnapshot,
};

/// Request state of a single feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedState<T> {
    /// Nothing requested yet.
    Idle,
    Loading,
    Ready(T),
    Error(String),
}

impl<T> Default for FeedState<T> {
    fn default() -> Self {
        FeedState::Idle
    }
}

impl<T> FeedState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, FeedState::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, FeedState::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            FeedState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FeedState::Error(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub weather: FeedState<WeatherSnapshot>,
    pub traffic: FeedState<TrafficSnapshot>,
    pub festivals: FeedState<FestivalSnapshot>,
    pub summary: FeedState<DashboardSummary>,
    pub orders: FeedState<Vec<PendingOrder>>,
    pub route: FeedState<OptimizedRoute>,

    /// Time of the last successful real-time fetch.
    pub last_updated: Option<DateTime<Local>>,

    /// Overall congestion of the traffic snapshot before the current one.
    pub previous_congestion: Option<f64>,
    last_congestion: Option<f64>,

    /// Oldest first, bounded by the store's log capacity.
    pub activity_log: VecDeque<LogEntry>,
}

impl StoreSnapshot {
    pub fn is_loading(&self, feed: Feed) -> bool {
        match feed {
            Feed::Weather => self.weather.is_loading(),
            Feed::Traffic => self.traffic.is_loading(),
            Feed::Festivals => self.festivals.is_loading(),
            Feed::Summary => self.summary.is_loading(),
            Feed::PendingOrders => self.orders.is_loading(),
            Feed::Route => self.route.is_loading(),
        }
    }

    pub fn is_ready(&self, feed: Feed) -> bool {
        match feed {
            Feed::Weather => self.weather.is_ready(),
            Feed::Traffic => self.traffic.is_ready(),
            Feed::Festivals => self.festivals.is_ready(),
            Feed::Summary => self.summary.is_ready(),
            Feed::PendingOrders => self.orders.is_ready(),
            Feed::Route => self.route.is_ready(),
        }
    }

    pub fn error(&self, feed: Feed) -> Option<&str> {
        match feed {
            Feed::Weather => self.weather.error(),
            Feed::Traffic => self.traffic.error(),
            Feed::Festivals => self.festivals.error(),
            Feed::Summary => self.summary.error(),
            Feed::PendingOrders => self.orders.error(),
            Feed::Route => self.route.error(),
        }
    }

    fn push_log(&mut self, level: LogLevel, message: String, capacity: usize) {
        self.activity_log.push_back(LogEntry {
            timestamp: Local::now(),
            level,
            message,
        });
        while self.activity_log.len() > capacity {
            self.activity_log.pop_front();
        }
    }
}

/// Payload types that own a slot in the store.
pub trait FeedData: Clone + Send + Sync + 'static {
    const FEED: Feed;

    fn slot(snapshot: &mut StoreSnapshot) -> &mut FeedState<Self>;

    /// Bookkeeping run right before the payload is stored.
    fn on_ready(_snapshot: &mut StoreSnapshot, _payload: &Self) {}
}

impl FeedData for WeatherSnapshot {
    const FEED: Feed = Feed::Weather;

    fn slot(snapshot: &mut StoreSnapshot) -> &mut FeedState<Self> {
        &mut snapshot.weather
    }

    fn on_ready(snapshot: &mut StoreSnapshot, _payload: &Self) {
        snapshot.last_updated = Some(Local::now());
    }
}

impl FeedData for TrafficSnapshot {
    const FEED: Feed = Feed::Traffic;

    fn slot(snapshot: &mut StoreSnapshot) -> &mut FeedState<Self> {
        &mut snapshot.traffic
    }

    fn on_ready(snapshot: &mut StoreSnapshot, payload: &Self) {
        snapshot.last_updated = Some(Local::now());
        snapshot.previous_congestion = snapshot.last_congestion;
        snapshot.last_congestion = payload.overall_city_congestion;
    }
}

impl FeedData for FestivalSnapshot {
    const FEED: Feed = Feed::Festivals;

    fn slot(snapshot: &mut StoreSnapshot) -> &mut FeedState<Self> {
        &mut snapshot.festivals
    }

    fn on_ready(snapshot: &mut StoreSnapshot, _payload: &Self) {
        snapshot.last_updated = Some(Local::now());
    }
}

impl FeedData for DashboardSummary {
    const FEED: Feed = Feed::Summary;

    fn slot(snapshot: &mut StoreSnapshot) -> &mut FeedState<Self> {
        &mut snapshot.summary
    }
}

impl FeedData for Vec<PendingOrder> {
    const FEED: Feed = Feed::PendingOrders;

    fn slot(snapshot: &mut StoreSnapshot) -> &mut FeedState<Self> {
        &mut snapshot.orders
    }
}

impl FeedData for OptimizedRoute {
    const FEED: Feed = Feed::Route;

    fn slot(snapshot: &mut StoreSnapshot) -> &mut FeedState<Self> {
        &mut snapshot.route
    }
}

/// Generation of a feed request; results from older generations are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Epoch(u64);

pub struct DashboardStore {
    state: watch::Sender<StoreSnapshot>,
    epochs: [AtomicU64; Feed::COUNT],
    log_capacity: usize,
}

impl DashboardStore {
    pub fn new(log_capacity: usize) -> Self {
        let (state, _) = watch::channel(StoreSnapshot::default());
        Self {
            state,
            epochs: Default::default(),
            log_capacity: log_capacity.max(1),
        }
    }

    /// Receiver notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.state.subscribe()
    }

    /// Run a typed selector against the current state without cloning it.
    pub fn select<R>(&self, selector: impl FnOnce(&StoreSnapshot) -> R) -> R {
        selector(&self.state.borrow())
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.borrow().clone()
    }

    /// Start a new request generation for `T`'s feed and mark it loading.
    pub fn begin<T: FeedData>(&self) -> Epoch {
        let epoch = self.epochs[T::FEED.index()].fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|snapshot| *T::slot(snapshot) = FeedState::Loading);
        Epoch(epoch)
    }

    /// Store the outcome of the request started at `epoch`.
    ///
    /// Returns `DashError::Stale` and leaves the state untouched when a newer
    /// request has been started since.
    pub fn complete<T: FeedData>(&self, epoch: Epoch, result: Result<T, String>) -> Result<(), DashError> {
        let feed = T::FEED;
        let counter = &self.epochs[feed.index()];
        let capacity = self.log_capacity;
        let mut stale = false;

        self.state.send_if_modified(|snapshot| {
            if counter.load(Ordering::SeqCst) != epoch.0 {
                stale = true;
                return false;
            }
            match result {
                Ok(payload) => {
                    T::on_ready(snapshot, &payload);
                    *T::slot(snapshot) = FeedState::Ready(payload);
                }
                Err(message) => {
                    snapshot.push_log(
                        LogLevel::Warn,
                        format!("{} fetch failed: {}", feed, message),
                        capacity,
                    );
                    *T::slot(snapshot) = FeedState::Error(message);
                }
            }
            true
        });

        if stale {
            debug!("Discarding stale {} result from epoch {}", feed, epoch.0);
            return Err(DashError::Stale(feed));
        }
        Ok(())
    }

    /// Append to the bounded activity log shown on screen.
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        let capacity = self.log_capacity;
        self.state
            .send_modify(|snapshot| snapshot.push_log(level, message, capacity));
    }
}

impl Default for DashboardStore {
    fn default() -> Self {
        Self::new(100)
    }
}
