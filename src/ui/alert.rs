//! Alert overlay rendering.
//!
//! Shows the oldest undismissed alert as a modal on top of the charts. The
//! border and title switch to the flash style while the alert pulse is on.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::data::duration::format_duration;

/// Minimum width required for the alert overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 30;
/// Minimum height required for the alert overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 7;

/// Render the front alert as a modal overlay.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    // Skip rendering if terminal is too small for the overlay
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }

    let Some(alert) = app.current_alert() else {
        return;
    };

    // Width: 60% of screen, clamped to [MIN_OVERLAY_WIDTH, 70]
    let overlay_width = (area.width * 60 / 100).clamp(MIN_OVERLAY_WIDTH, 70);
    let overlay_height = MIN_OVERLAY_HEIGHT + 2;

    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay_area = Rect::new(x, y, overlay_width, overlay_height.min(area.height));

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let flashing = app.is_flashing();
    let border_style = if flashing {
        app.theme.flash
    } else {
        Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD)
    };

    let pending = app.alerts.len();
    let title = if pending > 1 {
        format!(" ALERT (1 of {}) ", pending)
    } else {
        " ALERT ".to_string()
    };

    let block = Block::default()
        .title(Span::styled(title, border_style))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(border_style);
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let chunks = Layout::vertical([
        Constraint::Min(1),    // Message
        Constraint::Length(1), // Footer
    ])
    .split(inner);

    let message = Paragraph::new(Line::from(Span::styled(
        alert.message.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    frame.render_widget(message, chunks[0]);

    let footer = Paragraph::new(format!(
        "received {} ago | Enter/Esc to dismiss",
        format_duration(alert.received.elapsed())
    ))
    .alignment(Alignment::Center)
    .style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(footer, chunks[1]);
}
