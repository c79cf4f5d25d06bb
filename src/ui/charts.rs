//! Line charts of the sample windows.
//!
//! Every frame re-renders the full window; the x-axis is arrival index within
//! the window and the y-axis is fitted to the current values.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::{App, View};
use crate::data::{Metric, SampleWindow, WINDOW_CAPACITY};

/// Render the current view: all three charts stacked, or one full size.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_view {
        View::All => {
            let rows = Layout::vertical([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(area);
            for (metric, row) in Metric::ALL.into_iter().zip(rows.iter()) {
                render_metric(frame, app, metric, *row);
            }
        }
        View::Metric(metric) => render_metric(frame, app, metric, area),
    }
}

fn render_metric(frame: &mut Frame, app: &App, metric: Metric, area: Rect) {
    let window = app.session.windows().get(metric);
    let color = app.theme.series_color(metric);

    let block = Block::default()
        .title(title(metric, window))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let Some((min, max)) = window.bounds() else {
        let placeholder = Paragraph::new(format!("Waiting for {} ...", metric.topic()))
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    };

    let points = window.points();
    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points);

    let y_bounds = y_axis_bounds(min, max);
    let x_axis = Axis::default()
        .style(Style::default().fg(app.theme.border))
        .bounds([0.0, (WINDOW_CAPACITY - 1) as f64]);
    let y_axis = Axis::default()
        .style(Style::default().fg(app.theme.border))
        .bounds(y_bounds)
        .labels(
            axis_labels(y_bounds, metric.unit())
                .into_iter()
                .map(Span::raw)
                .collect::<Vec<_>>(),
        );

    let chart = Chart::new(vec![dataset]).block(block).x_axis(x_axis).y_axis(y_axis);
    frame.render_widget(chart, area);
}

fn title(metric: Metric, window: &SampleWindow) -> Line<'static> {
    let latest = match window.latest() {
        Some(value) => format!("{}{}", format_value(value), metric.unit()),
        None => "-".to_string(),
    };
    Line::from(vec![
        Span::styled(
            format!(" {} ", metric.label()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("{} ({}/{}) ", latest, window.len(), WINDOW_CAPACITY)),
    ])
}

/// Pad the data range so the line never sits on the border.
///
/// A flat series gets a fixed margin of one unit either side.
pub fn y_axis_bounds(min: f64, max: f64) -> [f64; 2] {
    let span = max - min;
    if span <= f64::EPSILON {
        return [min - 1.0, max + 1.0];
    }
    let pad = span * 0.1;
    [min - pad, max + pad]
}

/// Low, middle and high axis labels with the unit suffix.
pub fn axis_labels(bounds: [f64; 2], unit: &str) -> Vec<String> {
    let [low, high] = bounds;
    [low, (low + high) / 2.0, high]
        .into_iter()
        .map(|v| format!("{}{}", format_value(v), unit))
        .collect()
}

fn format_value(v: f64) -> String {
    if v.abs() >= 100.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.1}", v)
    }
}
