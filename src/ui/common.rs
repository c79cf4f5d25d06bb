//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::duration::format_duration;

/// Render the header bar with source status and counters.
///
/// While the alert pulse is on, the whole bar is drawn in the flash style.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let error = app.source_error.as_deref();
    let status_style = app.theme.source_style(error);
    let status_text = match error {
        None => "live".to_string(),
        Some(err) => err.to_string(),
    };

    let pending = app.alerts.len();
    let alerts_span = if pending > 0 {
        Span::styled(
            format!("{} pending", pending),
            Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled("0 pending", Style::default().add_modifier(Modifier::DIM))
    };

    let last = match app.last_message {
        Some(at) => format!("{} ago", format_duration(at.elapsed())),
        None => "never".to_string(),
    };

    let line = Line::from(vec![
        Span::styled(" ● ", status_style),
        Span::styled("SENSORWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(status_text, status_style),
        Span::raw(" │ "),
        Span::styled(
            format_count(app.session.message_count()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" msgs │ "),
        Span::raw(format!("{} alerts, ", format_count(app.session.alert_count()))),
        alerts_span,
        Span::raw(format!(" │ last {}", last)),
    ]);

    let mut paragraph = Paragraph::new(line);
    if app.is_flashing() {
        paragraph = paragraph.style(app.theme.flash);
    }
    frame.render_widget(paragraph, area);
}

/// Format a count for display (e.g., 1234 -> "1.2K", 1234567 -> "1.2M").
fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, view)| Line::from(format!(" {}:{} ", i, view.label())))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.current_view.index())
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows: source, current view, available controls.
/// Also displays temporary status messages.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = if app.current_alert().is_some() {
        "Enter/Esc:dismiss alert Tab:switch ?:help q:quit"
    } else {
        "Tab:switch 0-3:view e:export ?:help q:quit"
    };

    let status = format!(
        " {} | {} | {}",
        app.source_description(),
        app.current_view.label(),
        controls,
    );

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Views",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  Tab/S-Tab   Next/previous view"),
        Line::from("  ←/→ h/l     Next/previous view"),
        Line::from("  0           All charts"),
        Line::from("  1 2 3       Temperature/Humidity/Sound"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Alerts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  Enter/Esc   Dismiss current alert"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  e           Export to JSON"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 44u16.min(area.width.saturating_sub(4));
    let help_height = 20u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
