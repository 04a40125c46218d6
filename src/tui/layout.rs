//! TUI layout and widget rendering.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, Paragraph, Wrap};

use super::runtime::App;
use super::style;
use crate::audit::kpi::{
    LABEL_CO2, LABEL_CO2_SAVED, LABEL_COST, LABEL_CREDITS, LABEL_ENERGY, LABEL_PEAK, MetricsRecord,
};
use crate::audit::refresh::WAITING_MESSAGE;

/// Renders the full TUI frame.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(4), // KPI tiles
            Constraint::Min(10),   // charts
            Constraint::Length(3), // share gauge
            Constraint::Length(1), // status line
            Constraint::Length(1), // footer
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    match app.metrics() {
        Some(m) => {
            render_tiles(frame, m, chunks[1]);
            render_charts(frame, app, chunks[2]);
        }
        None => render_waiting(frame, chunks[1].union(chunks[2])),
    }
    render_share_gauge(frame, app, chunks[3]);
    render_status(frame, app, chunks[4]);
    render_footer(frame, chunks[5]);
}

/// Header bar: title, sample count, refresh interval, run state.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let (state_icon, state_label) = if app.paused {
        ("‖", "PAUSED")
    } else {
        ("▶", "LIVE")
    };
    let samples = app.metrics().map_or(0, |m| m.sample_count);

    let header = Line::from(vec![
        Span::styled(
            " GREEN AUDIT ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " samples={} │ cycle {} │ {}ms │ {} {} ",
            samples,
            app.cycles(),
            app.interval().as_millis(),
            state_icon,
            state_label,
        )),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

/// Six KPI tiles in report order.
fn render_tiles(frame: &mut Frame, m: &MetricsRecord, area: Rect) {
    let tiles = [
        (LABEL_ENERGY, format!("{:.2}", m.total_energy_kwh), style::ENERGY_COLOR),
        (LABEL_COST, format!("{:.2}", m.total_cost), Color::White),
        (LABEL_CO2, format!("{:.2}", m.total_co2_kg), style::CO2_COLOR),
        (LABEL_CO2_SAVED, format!("{:.2}", m.total_co2_saved_kg), style::GREEN),
        (LABEL_CREDITS, format!("{:.2}", m.total_carbon_credits), style::GREEN),
        (LABEL_PEAK, m.peak_time_display(), style::POWER_COLOR),
    ];

    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 6); 6])
        .split(area);

    for ((label, value, color), cell) in tiles.into_iter().zip(cells.iter()) {
        let tile = Paragraph::new(Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().title(format!(" {label} ")).borders(Borders::ALL));
        frame.render_widget(tile, *cell);
    }
}

/// Power chart on the left, energy and CO2 per sample on the right.
fn render_charts(frame: &mut Frame, app: &App, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let offset = app
        .metrics()
        .map_or(0, |m| m.sample_count.saturating_sub(app.rows.len()));
    let point = |i: usize, y: f64| ((offset + i) as f64, y);

    let power: Vec<(f64, f64)> = app
        .rows
        .iter()
        .enumerate()
        .map(|(i, r)| point(i, r.power_w))
        .collect();
    let energy: Vec<(f64, f64)> = app
        .rows
        .iter()
        .enumerate()
        .map(|(i, r)| point(i, r.energy_kwh))
        .collect();
    let co2: Vec<(f64, f64)> = app
        .rows
        .iter()
        .enumerate()
        .map(|(i, r)| point(i, r.co2_kg))
        .collect();

    render_chart(
        frame,
        halves[0],
        " Power Consumption ",
        "W",
        vec![
            Dataset::default()
                .name("Power")
                .marker(symbols::Marker::Braille)
                .style(Style::default().fg(style::POWER_COLOR))
                .data(&power),
        ],
        &[power.as_slice()],
    );
    render_chart(
        frame,
        halves[1],
        " Energy and CO2 per Sample ",
        "kWh / kg",
        vec![
            Dataset::default()
                .name("Energy")
                .marker(symbols::Marker::Braille)
                .style(Style::default().fg(style::ENERGY_COLOR))
                .data(&energy),
            Dataset::default()
                .name("CO2")
                .marker(symbols::Marker::Dot)
                .style(Style::default().fg(style::CO2_COLOR))
                .data(&co2),
        ],
        &[energy.as_slice(), co2.as_slice()],
    );
}

fn render_chart(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    unit: &str,
    datasets: Vec<Dataset>,
    series: &[&[(f64, f64)]],
) {
    let y_bounds = style::auto_bounds_y(series);
    let first = series.first().copied().unwrap_or_default();
    let x_lo = first.first().map_or(0.0, |p| p.0);
    let x_hi = first.last().map_or(1.0, |p| p.0).max(x_lo + 1.0);

    let chart = Chart::new(datasets)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .title("sample")
                .bounds([x_lo, x_hi])
                .labels(vec![format!("{}", x_lo as u64), format!("{}", x_hi as u64)]),
        )
        .y_axis(
            Axis::default()
                .title(unit.to_string())
                .bounds(y_bounds)
                .labels(vec![format!("{:.2}", y_bounds[0]), format!("{:.2}", y_bounds[1])]),
        );

    frame.render_widget(chart, area);
}

/// Placeholder shown until the store holds samples.
fn render_waiting(frame: &mut Frame, area: Rect) {
    let text = Paragraph::new(Line::from(Span::styled(
        WAITING_MESSAGE,
        Style::default().fg(style::WARN_COLOR).add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(Block::default().title(" Live Metrics ").borders(Borders::ALL));
    frame.render_widget(text, area);
}

/// Renewable share gauge.
fn render_share_gauge(frame: &mut Frame, app: &App, area: Rect) {
    let percent = app.share_percent();
    let gauge = Gauge::default()
        .block(Block::default().title(" Renewable Share ").borders(Borders::ALL))
        .gauge_style(Style::default().fg(style::share_color(percent)))
        .percent(u16::from(percent))
        .label(format!("{percent}%"));
    frame.render_widget(gauge, area);
}

/// Store problems take precedence over action feedback.
fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = match (app.store_error(), &app.status) {
        (Some(e), _) => Line::from(Span::styled(
            format!(" store unavailable: {e}"),
            Style::default().fg(style::WARN_COLOR),
        )),
        (None, Some(msg)) => Line::from(format!(" {msg}")),
        (None, None) => Line::from(""),
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Footer with keybinding hints.
fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(Span::styled(
        " q:Quit  Space:Pause  +/-:Share ±5  ←/→:Share ±1  e:Export report  r:Refresh",
        Style::default().fg(style::FOOTER_FG),
    )));
    frame.render_widget(footer, area);
}
