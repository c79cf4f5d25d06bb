//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::Metric;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for a source that is connecting or has failed.
    pub warning: Color,
    /// Color for alerts.
    pub critical: Color,
    /// Color for a live source.
    pub healthy: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Line color per metric, in [`Metric::ALL`] order.
    pub series: [Color; 3],
    /// Style for titles.
    pub header: Style,
    /// Style for the active tab.
    pub tab_active: Style,
    /// Style for inactive tabs.
    pub tab_inactive: Style,
    /// Style applied while the alert pulse is on.
    pub flash: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::Gray,
            series: [Color::LightRed, Color::LightBlue, Color::LightGreen],
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            flash: Style::default().fg(Color::Black).bg(Color::Red).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::DarkGray,
            series: [Color::Red, Color::Blue, Color::Green],
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            flash: Style::default().fg(Color::White).bg(Color::Red).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Line color for a metric's chart.
    pub fn series_color(&self, metric: Metric) -> Color {
        let index = Metric::ALL.iter().position(|m| *m == metric).unwrap_or(0);
        self.series[index]
    }

    /// Style for the source status: live, or the error text.
    pub fn source_style(&self, error: Option<&str>) -> Style {
        match error {
            None => Style::default().fg(self.healthy),
            Some(_) => Style::default().fg(self.warning).add_modifier(Modifier::BOLD),
        }
    }
}
