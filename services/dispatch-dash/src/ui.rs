// services/dispatch-dash/src/ui.rs
//
// Rendering for the dashboard and route screens

use ratatui::{prelude::*, widgets::*};

use dispatch_dash::nav::{self, Screen, APP_TITLE};
use dispatch_dash::screens::{DashboardView, RouteView};
use dispatch_dash::status::{FeedView, ScreenStatus};
use dispatch_dash::store::{LogLevel, StoreSnapshot};
use dispatch_dash::transform::{
    format_humidity, format_temperature, format_wind, overall_congestion, traffic_label, ActivityKind,
    Trend, WeatherCondition,
};

use crate::{App, Mounted};

mod colors {
    use ratatui::style::Color;

    pub const TEAL: Color = Color::Rgb(42, 161, 152);
    pub const DARK_TEAL: Color = Color::Rgb(7, 80, 86);
    pub const WHITE: Color = Color::Rgb(253, 246, 227);
    pub const SILVER: Color = Color::Rgb(147, 161, 161);
    pub const GOLD: Color = Color::Rgb(255, 193, 37);
    pub const BG_DARK: Color = Color::Rgb(0, 20, 30);
    pub const BG_PANEL: Color = Color::Rgb(7, 30, 41);
    pub const SUCCESS: Color = Color::Rgb(133, 153, 0);
    pub const ERROR: Color = Color::Rgb(220, 50, 47);
}

pub fn draw_ui(frame: &mut Frame, app: &App, snapshot: &StoreSnapshot) {
    let area = frame.area();

    frame.render_widget(
        Block::default().style(Style::default().bg(colors::BG_DARK)),
        area,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(1), // Banner
            Constraint::Min(10),   // Screen
            Constraint::Length(3), // Footer
        ])
        .split(area);

    draw_header(frame, chunks[0], app, snapshot);

    match &app.mounted {
        Mounted::Dashboard(screen) => {
            let view = screen.view(snapshot);
            draw_banner(frame, chunks[1], &view.status);
            draw_dashboard(frame, chunks[2], &view, snapshot);
        }
        Mounted::Route(screen) => {
            let view = screen.view(snapshot);
            draw_banner(frame, chunks[1], &view.status);
            draw_route(frame, chunks[2], &view, app);
        }
    }

    draw_footer(frame, chunks[3], app.screen());
}

fn panel(title: &str) -> Block<'static> {
    Block::default()
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(colors::WHITE).bold(),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::SILVER))
        .border_type(BorderType::Rounded)
        .style(Style::default().bg(colors::BG_PANEL))
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App, snapshot: &StoreSnapshot) {
    let current = app.screen();
    let mut spans = vec![
        Span::styled(
            format!(" {} ", APP_TITLE.to_uppercase()),
            Style::default().fg(colors::WHITE).bg(colors::DARK_TEAL).bold(),
        ),
        Span::raw("  "),
    ];

    for screen in Screen::ALL {
        let style = if screen == current {
            Style::default().fg(colors::GOLD).bold()
        } else {
            Style::default().fg(colors::SILVER)
        };
        spans.push(Span::styled(format!(" {} ", screen.title()), style));
    }

    for item in nav::badged_items() {
        if let Some(badge) = item.badge() {
            spans.push(Span::styled(format!(" {} ", item.name), Style::default().fg(colors::SILVER)));
            spans.push(Span::styled(
                format!("({})", badge),
                Style::default().fg(colors::WHITE).bg(colors::ERROR).bold(),
            ));
        }
    }

    let (mode_text, mode_color) = if app.demo {
        ("DEMO", colors::GOLD)
    } else {
        ("LIVE", colors::SUCCESS)
    };
    spans.push(Span::raw("  "));
    spans.push(Span::styled(format!("[{}]", mode_text), Style::default().fg(mode_color).bold()));

    let updated = snapshot
        .last_updated
        .map(|t| format!("Updated {}", t.format("%H:%M:%S")))
        .unwrap_or_else(|| "Waiting for live data".to_string());
    spans.push(Span::raw("  "));
    spans.push(Span::styled(updated, Style::default().fg(colors::SILVER)));

    let header = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(colors::DARK_TEAL))
                .style(Style::default().bg(colors::BG_DARK)),
        );

    frame.render_widget(header, area);
}

fn draw_banner(frame: &mut Frame, area: Rect, status: &ScreenStatus) {
    let line = match (&status.error, status.loading) {
        (Some(message), _) => Line::from(Span::styled(
            format!(" ! {} ", message),
            Style::default().fg(colors::WHITE).bg(colors::ERROR).bold(),
        )),
        (None, true) => Line::from(Span::styled(" Loading... ", Style::default().fg(colors::GOLD))),
        (None, false) => Line::from(""),
    };
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

/// Placeholder lines for a card whose feed is not ready.
fn feed_placeholder<T>(view: &FeedView<'_, T>) -> Option<Vec<Line<'static>>> {
    match view {
        FeedView::Content(_) => None,
        FeedView::Pending => Some(vec![Line::from(Span::styled(
            "Waiting for data",
            Style::default().fg(colors::SILVER),
        ))]),
        FeedView::Spinner => Some(vec![Line::from(Span::styled(
            "Loading...",
            Style::default().fg(colors::GOLD),
        ))]),
        FeedView::Unavailable(message) => Some(vec![Line::from(Span::styled(
            format!("Unavailable: {}", message),
            Style::default().fg(colors::ERROR),
        ))]),
    }
}

fn draw_dashboard(frame: &mut Frame, area: Rect, view: &DashboardView<'_>, snapshot: &StoreSnapshot) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(9),
            Constraint::Min(8),
        ])
        .split(area);

    draw_stat_boxes(frame, rows[0], view);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(40),
            Constraint::Percentage(30),
        ])
        .split(rows[1]);
    draw_weather_card(frame, cards[0], view);
    draw_traffic_card(frame, cards[1], view);
    draw_festival_card(frame, cards[2], view);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(rows[2]);
    draw_failure_breakdown(frame, bottom[0], view);
    draw_area_chart(frame, bottom[1], view);
    draw_trend(frame, bottom[2], view);
    draw_activity(frame, bottom[3], view, snapshot);
}

fn draw_stat_boxes(frame: &mut Frame, area: Rect, view: &DashboardView<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25); 4])
        .split(area);

    let cards = &view.cards;
    draw_stat_box(frame, chunks[0], "TOTAL DELIVERIES", &cards.total_deliveries.to_string(), colors::WHITE);
    draw_stat_box(frame, chunks[1], "SUCCESS RATE", &cards.success_rate, colors::SUCCESS);
    draw_stat_box(frame, chunks[2], "AVG DELIVERY TIME", &cards.average_time, colors::GOLD);
    draw_stat_box(
        frame,
        chunks[3],
        "FAILED",
        &cards.failed_deliveries.to_string(),
        if cards.failed_deliveries > 0 { colors::ERROR } else { colors::SILVER },
    );
}

fn draw_stat_box(frame: &mut Frame, area: Rect, label: &str, value: &str, value_color: Color) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::SILVER))
        .border_type(BorderType::Rounded)
        .style(Style::default().bg(colors::BG_PANEL));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let text = vec![
        Line::from(Span::styled(
            label,
            Style::default().fg(colors::SILVER).add_modifier(Modifier::DIM),
        )),
        Line::from(Span::styled(value, Style::default().fg(value_color).bold())),
    ];

    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), inner);
}

fn condition_icon(condition: WeatherCondition) -> &'static str {
    match condition {
        WeatherCondition::Sunny => "☀",
        WeatherCondition::Rain => "☂",
        WeatherCondition::Cloud => "☁",
        WeatherCondition::Snow => "❄",
        WeatherCondition::Storm => "⚡",
        WeatherCondition::Haze => "≋",
        WeatherCondition::Other => "·",
    }
}

fn draw_weather_card(frame: &mut Frame, area: Rect, view: &DashboardView<'_>) {
    let lines = feed_placeholder(&view.weather).unwrap_or_else(|| {
        let FeedView::Content(weather) = &view.weather else {
            return Vec::new();
        };
        let icon = view.condition.map(condition_icon).unwrap_or("·");
        vec![
            Line::from(vec![
                Span::styled(format!("{} ", icon), Style::default().fg(colors::GOLD)),
                Span::styled(weather.conditions.clone(), Style::default().fg(colors::WHITE).bold()),
            ]),
            Line::from(Span::styled(
                format_temperature(weather.temperature.as_ref()),
                Style::default().fg(colors::GOLD),
            )),
            Line::from(format!("Humidity: {}", format_humidity(weather.humidity))),
            Line::from(format!("Wind: {}", format_wind(weather.wind.as_ref()))),
        ]
    });

    frame.render_widget(Paragraph::new(lines).block(panel("WEATHER")), area);
}

fn draw_traffic_card(frame: &mut Frame, area: Rect, view: &DashboardView<'_>) {
    let lines = feed_placeholder(&view.traffic).unwrap_or_else(|| {
        let FeedView::Content(traffic) = &view.traffic else {
            return Vec::new();
        };
        let overall = overall_congestion(traffic);
        let trend = match view.congestion_trend {
            Trend::Up(p) => Span::styled(format!("▲ {:.0}%", p), Style::default().fg(colors::ERROR)),
            Trend::Down(p) => Span::styled(format!("▼ {:.0}%", p), Style::default().fg(colors::SUCCESS)),
            Trend::Flat => Span::styled("■ steady", Style::default().fg(colors::SILVER)),
        };

        let mut lines = vec![Line::from(vec![
            Span::styled(
                format!("City: {:.1}/10 {} ", overall, traffic_label(overall)),
                Style::default().fg(colors::WHITE).bold(),
            ),
            trend,
        ])];
        if let Some(status) = &traffic.status {
            lines.push(Line::from(Span::styled(status.clone(), Style::default().fg(colors::SILVER))));
        }
        lines.push(Line::from(""));
        for area in &view.top_congested {
            lines.push(Line::from(vec![
                Span::styled(format!("{:<12}", area.name), Style::default().fg(colors::WHITE)),
                Span::styled(
                    format!("{:>4.1} {:<9}", area.congestion_level, traffic_label(area.congestion_level)),
                    Style::default().fg(colors::GOLD),
                ),
                Span::styled(format!("+{} min", area.delay_minutes), Style::default().fg(colors::SILVER)),
            ]));
        }
        lines
    });

    frame.render_widget(Paragraph::new(lines).block(panel("TRAFFIC")), area);
}

fn draw_festival_card(frame: &mut Frame, area: Rect, view: &DashboardView<'_>) {
    let lines = feed_placeholder(&view.festivals).unwrap_or_else(|| {
        let FeedView::Content(festivals) = &view.festivals else {
            return Vec::new();
        };
        if festivals.festivals.is_empty() {
            return vec![Line::from(Span::styled(
                "No events today",
                Style::default().fg(colors::SILVER),
            ))];
        }
        let mut lines: Vec<Line> = festivals
            .festivals
            .iter()
            .map(|f| {
                Line::from(vec![
                    Span::styled(f.name.clone(), Style::default().fg(colors::WHITE).bold()),
                    Span::styled(
                        format!(
                            "  {} {}",
                            f.area.as_deref().unwrap_or("-"),
                            f.expected_impact.as_deref().unwrap_or("")
                        ),
                        Style::default().fg(colors::SILVER),
                    ),
                ])
            })
            .collect();
        if let Some(summary) = &festivals.summary {
            lines.push(Line::from(Span::styled(summary.clone(), Style::default().fg(colors::GOLD))));
        }
        lines
    });

    frame.render_widget(
        Paragraph::new(lines).block(panel("EVENTS")).wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_failure_breakdown(frame: &mut Frame, area: Rect, view: &DashboardView<'_>) {
    let total: u64 = view.failures.values.iter().sum();
    let lines: Vec<Line> = view
        .failures
        .labels
        .iter()
        .zip(&view.failures.values)
        .map(|(label, value)| {
            let share = if total > 0 { *value as f64 * 100.0 / total as f64 } else { 0.0 };
            Line::from(vec![
                Span::styled("● ", Style::default().fg(colors::ERROR)),
                Span::styled(label.clone(), Style::default().fg(colors::WHITE)),
                Span::styled(format!("  {:.0}%", share), Style::default().fg(colors::SILVER)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(panel("FAILURE REASONS")), area);
}

fn draw_area_chart(frame: &mut Frame, area: Rect, view: &DashboardView<'_>) {
    let data: Vec<(&str, u64)> = view
        .by_area
        .labels
        .iter()
        .map(String::as_str)
        .zip(view.by_area.values.iter().copied())
        .collect();

    let chart = BarChart::default()
        .block(panel("DELIVERIES BY AREA"))
        .data(data.as_slice())
        .bar_width(5)
        .bar_gap(1)
        .bar_style(Style::default().fg(colors::TEAL))
        .value_style(Style::default().fg(colors::BG_DARK).bg(colors::TEAL));

    frame.render_widget(chart, area);
}

fn draw_trend(frame: &mut Frame, area: Rect, view: &DashboardView<'_>) {
    let title = if view.trend.placeholder {
        "WEEKLY SUCCESS (SAMPLE)"
    } else {
        "WEEKLY SUCCESS"
    };
    let values: Vec<u64> = view.trend.values.iter().map(|v| v.round() as u64).collect();

    let sparkline = Sparkline::default()
        .block(panel(title))
        .data(&values)
        .max(100)
        .style(Style::default().fg(colors::GOLD));

    frame.render_widget(sparkline, area);
}

fn draw_activity(frame: &mut Frame, area: Rect, view: &DashboardView<'_>, snapshot: &StoreSnapshot) {
    let mut lines: Vec<Line> = view
        .recent
        .iter()
        .map(|row| {
            let color = match row.kind {
                ActivityKind::Delivery | ActivityKind::RouteOptimized => colors::SUCCESS,
                ActivityKind::FailedDelivery => colors::ERROR,
                ActivityKind::WeatherAlert => colors::GOLD,
                ActivityKind::Other => colors::SILVER,
            };
            Line::from(vec![
                Span::styled(format!("{} ", row.action), Style::default().fg(color).bold()),
                Span::styled(row.details.clone(), Style::default().fg(colors::WHITE)),
                Span::styled(format!(" {}", row.time), Style::default().fg(colors::SILVER)),
            ])
        })
        .collect();

    lines.push(Line::from(""));
    lines.extend(log_lines(snapshot, 8));

    frame.render_widget(
        Paragraph::new(lines).block(panel("RECENT ACTIVITY")).wrap(Wrap { trim: true }),
        area,
    );
}

fn log_lines(snapshot: &StoreSnapshot, limit: usize) -> Vec<Line<'_>> {
    snapshot
        .activity_log
        .iter()
        .rev()
        .take(limit)
        .map(|entry| {
            let (prefix, color) = match entry.level {
                LogLevel::Error => ("[ERR]", colors::ERROR),
                LogLevel::Warn => ("[WRN]", colors::GOLD),
                LogLevel::Info => ("[INF]", colors::SUCCESS),
            };
            Line::from(vec![
                Span::styled(
                    format!("{} ", entry.timestamp.format("%H:%M:%S")),
                    Style::default().fg(colors::SILVER).add_modifier(Modifier::DIM),
                ),
                Span::styled(format!("{} ", prefix), Style::default().fg(color)),
                Span::styled(entry.message.as_str(), Style::default().fg(colors::WHITE)),
            ])
        })
        .collect()
}

fn draw_route(frame: &mut Frame, area: Rect, view: &RouteView<'_>, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    draw_orders(frame, chunks[0], view, app.cursor);
    draw_route_panel(frame, chunks[1], view, app.optimizing);
}

fn draw_orders(frame: &mut Frame, area: Rect, view: &RouteView<'_>, cursor: usize) {
    let title = format!("PENDING ORDERS ({} selected)", view.selected_count);
    let lines = feed_placeholder(&view.orders).unwrap_or_else(|| {
        let mut lines = vec![Line::from(Span::styled(
            format!("[A] {}", view.toggle_all_label),
            Style::default().fg(colors::GOLD),
        ))];
        if view.groups.is_empty() {
            lines.push(Line::from(Span::styled(
                "No pending orders",
                Style::default().fg(colors::SILVER),
            )));
        }

        let mut index = 0;
        for (area_name, orders) in view.groups.iter() {
            lines.push(Line::from(Span::styled(
                area_name.to_string(),
                Style::default().fg(colors::TEAL).bold(),
            )));
            for order in orders {
                let checked = if view.selected_ids.contains(&order.order_id) { "[x]" } else { "[ ]" };
                let style = if index == cursor {
                    Style::default().fg(colors::BG_DARK).bg(colors::GOLD)
                } else {
                    Style::default().fg(colors::WHITE)
                };
                lines.push(Line::from(Span::styled(
                    format!(
                        " {} {}  {}  {} ({})",
                        checked, order.order_id, order.customer_name, order.address, order.package_size
                    ),
                    style,
                )));
                index += 1;
            }
        }
        lines
    });

    frame.render_widget(Paragraph::new(lines).block(panel(&title)), area);
}

fn draw_route_panel(frame: &mut Frame, area: Rect, view: &RouteView<'_>, optimizing: bool) {
    let block = panel(if view.show_map { "OPTIMIZED ROUTE" } else { "ROUTE" });

    if optimizing {
        frame.render_widget(
            Paragraph::new(Span::styled("Optimizing route...", Style::default().fg(colors::GOLD)))
                .block(block),
            area,
        );
        return;
    }

    let FeedView::Content(route) = &view.route else {
        let hint = if view.can_optimize {
            "Press [O] to optimize the selected orders"
        } else {
            "Select orders with [SPACE] to plan a route"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(hint, Style::default().fg(colors::SILVER))).block(block),
            area,
        );
        return;
    };

    if !view.show_map {
        let summary = format!(
            "Route ready: {} stops, {} / {}  (press [M] to show)",
            route.legs.len(),
            route.total_distance,
            route.total_duration
        );
        frame.render_widget(
            Paragraph::new(Span::styled(summary, Style::default().fg(colors::WHITE))).block(block),
            area,
        );
        return;
    }

    let rows: Vec<Row> = view
        .legs
        .iter()
        .map(|leg| {
            let traffic_style = match leg.traffic {
                "Light" => Style::default().fg(colors::SUCCESS),
                "Moderate" => Style::default().fg(colors::GOLD),
                "Heavy" => Style::default().fg(colors::ERROR),
                _ => Style::default().fg(colors::SILVER),
            };
            Row::new(vec![
                Cell::from(Span::styled(leg.from.clone(), Style::default().fg(colors::SILVER))),
                Cell::from(Span::styled(leg.to.clone(), Style::default().fg(colors::WHITE))),
                Cell::from(Span::styled(leg.to_address.clone(), Style::default().fg(colors::SILVER))),
                Cell::from(leg.distance_duration.clone()),
                Cell::from(Span::styled(leg.traffic, traffic_style)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Min(16),
            Constraint::Length(16),
            Constraint::Length(9),
        ],
    )
    .header(
        Row::new(vec![
            Cell::from(Span::styled("FROM", Style::default().fg(colors::GOLD).bold())),
            Cell::from(Span::styled("TO", Style::default().fg(colors::GOLD).bold())),
            Cell::from(Span::styled("ADDRESS", Style::default().fg(colors::GOLD).bold())),
            Cell::from(Span::styled("DIST (TIME)", Style::default().fg(colors::GOLD).bold())),
            Cell::from(Span::styled("TRAFFIC", Style::default().fg(colors::GOLD).bold())),
        ])
        .bottom_margin(1),
    )
    .block(panel(&format!(
        "OPTIMIZED ROUTE  {} / {}",
        route.total_distance, route.total_duration
    )));

    frame.render_widget(table, area);
}

fn draw_footer(frame: &mut Frame, area: Rect, screen: Screen) {
    let key = |k: &'static str, bg: Color| Span::styled(k, Style::default().fg(colors::BG_DARK).bg(bg));
    let label = |l: &'static str| Span::styled(l, Style::default().fg(colors::SILVER));

    let mut spans = vec![
        key(" [Q] ", colors::ERROR),
        label(" Quit  "),
        key(" [TAB] ", colors::TEAL),
        label(" Switch screen  "),
        key(" [R] ", colors::WHITE),
        label(" Refresh  "),
    ];
    if screen == Screen::Route {
        spans.extend([
            key(" [UP/DOWN] ", colors::SILVER),
            label(" Move  "),
            key(" [SPACE] ", colors::GOLD),
            label(" Select  "),
            key(" [A] ", colors::GOLD),
            label(" All  "),
            key(" [O] ", colors::SUCCESS),
            label(" Optimize  "),
            key(" [M] ", colors::TEAL),
            label(" Map "),
        ]);
    }

    let footer = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(colors::DARK_TEAL))
                .style(Style::default().bg(colors::BG_DARK)),
        );

    frame.render_widget(footer, area);
}
