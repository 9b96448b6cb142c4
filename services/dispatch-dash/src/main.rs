// services/dispatch-dash/src/main.rs
//
// Terminal dashboard for delivery dispatch
//
// Run with: cargo run --bin dispatch-dash -- --demo

use std::fs::OpenOptions;
use std::io::stdout;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dispatch_dash::nav::Screen;
use dispatch_dash::screens::{DashboardScreen, RouteScreen};
use dispatch_dash::store::{LogLevel, StoreSnapshot};
use dispatch_dash::{DashboardStore, DataSourceAdapter, DeliveryApi, HttpDeliveryApi, MockDeliveryApi};
use svckit::config::{load_config, DashboardConfig};
use svckit::errors::DashError;
use svckit::metrics;
use svckit::types::OptimizedRoute;

mod ui;

#[derive(Parser, Debug)]
#[command(name = "dispatch-dash")]
#[command(about = "Terminal dashboard for delivery dispatch: live conditions, KPIs and route planning")]
#[command(version = "0.1.0")]
struct Args {
    /// Run against a simulated backend (no API server required)
    #[arg(long, short)]
    demo: bool,

    /// Delivery API base URL (overrides the config file)
    #[arg(long)]
    api_url: Option<String>,

    /// Configuration file; missing files fall back to defaults
    #[arg(long, short, default_value = "config/dispatch-dash.yaml")]
    config: String,

    /// Real-time feed refresh interval in seconds
    #[arg(long)]
    refresh_secs: Option<u64>,

    /// Log file (the terminal is used by the UI)
    #[arg(long)]
    log_file: Option<String>,

    /// UI redraw interval in milliseconds
    #[arg(long, default_value = "250")]
    tick_ms: u64,
}

impl Args {
    fn apply(&self, config: &mut DashboardConfig) {
        if let Some(url) = &self.api_url {
            config.api.base_url = url.clone();
        }
        if let Some(secs) = self.refresh_secs {
            config.refresh.interval_secs = secs;
        }
        if let Some(path) = &self.log_file {
            config.observability.log_file = path.clone();
        }
    }
}

/// The mounted screen owns its poller; switching screens unmounts it.
pub enum Mounted {
    Dashboard(DashboardScreen),
    Route(RouteScreen),
}

pub struct App {
    pub mounted: Mounted,
    pub cursor: usize,
    pub demo: bool,
    pub optimizing: bool,
    adapter: DataSourceAdapter,
    config: DashboardConfig,
    results_tx: mpsc::UnboundedSender<Result<OptimizedRoute, DashError>>,
    results_rx: mpsc::UnboundedReceiver<Result<OptimizedRoute, DashError>>,
}

impl App {
    fn new(adapter: DataSourceAdapter, config: DashboardConfig, demo: bool) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            mounted: Mounted::Dashboard(DashboardScreen::mount(adapter.clone(), &config)),
            cursor: 0,
            demo,
            optimizing: false,
            adapter,
            config,
            results_tx,
            results_rx,
        }
    }

    pub fn screen(&self) -> Screen {
        match self.mounted {
            Mounted::Dashboard(_) => Screen::Dashboard,
            Mounted::Route(_) => Screen::Route,
        }
    }

    fn switch_screen(&mut self) {
        let next = match self.screen().next() {
            Screen::Dashboard => Mounted::Dashboard(DashboardScreen::mount(self.adapter.clone(), &self.config)),
            Screen::Route => Mounted::Route(RouteScreen::mount(self.adapter.clone(), &self.config)),
        };
        match std::mem::replace(&mut self.mounted, next) {
            Mounted::Dashboard(screen) => screen.unmount(),
            Mounted::Route(screen) => screen.unmount(),
        }
        self.cursor = 0;
    }

    fn refresh(&self) {
        match &self.mounted {
            Mounted::Dashboard(screen) => screen.refresh(),
            Mounted::Route(screen) => screen.refresh(),
        }
    }

    /// Order ids in the order the route screen lists them.
    fn listed_orders(&self, snapshot: &StoreSnapshot) -> Vec<String> {
        match &self.mounted {
            Mounted::Route(screen) => screen
                .view(snapshot)
                .groups
                .values()
                .flatten()
                .map(|order| order.order_id.clone())
                .collect(),
            Mounted::Dashboard(_) => Vec::new(),
        }
    }

    fn move_cursor(&mut self, delta: isize, snapshot: &StoreSnapshot) {
        let count = self.listed_orders(snapshot).len();
        if count == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = (self.cursor as isize + delta).clamp(0, count as isize - 1) as usize;
    }

    fn toggle_at_cursor(&mut self, snapshot: &StoreSnapshot) {
        let Some(order_id) = self.listed_orders(snapshot).get(self.cursor).cloned() else {
            return;
        };
        if let Mounted::Route(screen) = &mut self.mounted {
            if let Err(e) = screen.toggle(&order_id) {
                warn!("Toggle failed: {}", e);
            }
        }
    }

    fn start_optimization(&mut self) {
        let Mounted::Route(screen) = &self.mounted else {
            return;
        };
        if self.optimizing {
            return;
        }
        let order_ids = match screen.begin_optimization() {
            Ok(ids) => ids,
            Err(e) => {
                self.adapter.store().log(LogLevel::Warn, e.to_string());
                return;
            }
        };

        info!("Optimizing route for {} orders", order_ids.len());
        self.optimizing = true;
        let adapter = self.adapter.clone();
        let tx = self.results_tx.clone();
        tokio::spawn(async move {
            let result = adapter.optimize_route(&order_ids).await;
            let _ = tx.send(result);
        });
    }

    fn poll_optimization(&mut self) {
        while let Ok(result) = self.results_rx.try_recv() {
            self.optimizing = false;
            if let Mounted::Route(screen) = &mut self.mounted {
                screen.finish_optimization(&result);
            }
        }
    }

    fn on_tick(&mut self, snapshot: &StoreSnapshot) {
        self.poll_optimization();
        if let Mounted::Route(screen) = &mut self.mounted {
            screen.reconcile();
        }
        let count = self.listed_orders(snapshot).len();
        if self.cursor >= count {
            self.cursor = count.saturating_sub(1);
        }
    }

    fn unmount(self) {
        match self.mounted {
            Mounted::Dashboard(screen) => screen.unmount(),
            Mounted::Route(screen) => screen.unmount(),
        }
    }
}

fn init_tracing(config: &DashboardConfig) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.observability.log_file)
        .with_context(|| format!("opening log file {}", config.observability.log_file))?;

    let level = &config.observability.log_level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("dispatch_dash={},svckit={}", level, level).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    args.apply(&mut config);
    config.validate()?;

    init_tracing(&config)?;
    info!("Starting dispatch-dash v{}", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let _guard = runtime.enter();

    let api: Arc<dyn DeliveryApi> = if args.demo {
        info!("Demo mode: using simulated backend");
        Arc::new(MockDeliveryApi::new())
    } else {
        info!("Connecting to {}", config.api.base_url);
        Arc::new(HttpDeliveryApi::new(&config.api)?)
    };
    let store = Arc::new(DashboardStore::new(config.display.activity_log_capacity));
    let adapter = DataSourceAdapter::new(api, store.clone());

    if args.demo {
        store.log(LogLevel::Info, "Dashboard started in DEMO mode");
    } else {
        store.log(LogLevel::Info, format!("Dashboard started - connecting to {}", config.api.base_url));
    }

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let app = App::new(adapter, config, args.demo);
    let result = run_app(&mut terminal, app, &store, Duration::from_millis(args.tick_ms));

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    match metrics::encode_text() {
        Ok(text) => info!("Final metrics:\n{}", text),
        Err(e) => warn!("Failed to encode metrics: {}", e),
    }

    result
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    store: &DashboardStore,
    tick_rate: Duration,
) -> Result<()> {
    let mut updates = store.subscribe();
    let mut snapshot = updates.borrow_and_update().clone();

    loop {
        if updates.has_changed().unwrap_or(false) {
            snapshot = updates.borrow_and_update().clone();
        }
        app.on_tick(&snapshot);
        terminal.draw(|frame| ui::draw_ui(frame, &app, &snapshot))?;

        if !event::poll(tick_rate)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Tab => app.switch_screen(),
            KeyCode::Char('r') => app.refresh(),
            KeyCode::Up => app.move_cursor(-1, &snapshot),
            KeyCode::Down => app.move_cursor(1, &snapshot),
            KeyCode::Char(' ') => app.toggle_at_cursor(&snapshot),
            KeyCode::Char('a') => {
                if let Mounted::Route(screen) = &mut app.mounted {
                    screen.toggle_all();
                }
            }
            KeyCode::Char('o') => app.start_optimization(),
            KeyCode::Char('m') => {
                if let Mounted::Route(screen) = &mut app.mounted {
                    screen.toggle_map();
                }
            }
            _ => {}
        }
    }

    info!("Shutting down");
    app.unmount();
    Ok(())
}
