//! Application state and navigation logic.

use std::path::Path;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::data::Metric;
use crate::notify::{AlertQueue, FlashVibrator, PendingAlert};
use crate::session::Session;
use crate::source::MessageSource;
use crate::ui::Theme;

/// Upper bound on messages handled per UI tick, so a burst cannot stall input.
const MAX_MESSAGES_PER_TICK: usize = 512;

/// How long a status message stays in the status bar.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// The current view/tab in the TUI.
///
/// Pending alerts are shown as an overlay on top of any view rather than as a
/// separate view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// All three charts stacked.
    All,
    /// One metric full size.
    Metric(Metric),
}

impl View {
    /// Tab order.
    pub const ALL: [View; 4] = [
        View::All,
        View::Metric(Metric::Temperature),
        View::Metric(Metric::Humidity),
        View::Metric(Metric::Sound),
    ];

    /// Position in the tab bar.
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|v| *v == self).unwrap_or(0)
    }

    /// The view at tab position `index`, if any.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Cycle to the next view.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::All => "All",
            View::Metric(Metric::Temperature) => "Temperature",
            View::Metric(Metric::Humidity) => "Humidity",
            View::Metric(Metric::Sound) => "Sound",
        }
    }
}

#[derive(Serialize)]
struct WindowExport<'a> {
    metric: Metric,
    unit: &'a str,
    values: Vec<f64>,
}

#[derive(Serialize)]
struct StateExport<'a> {
    source: &'a str,
    message_count: u64,
    alert_count: u64,
    pending_alerts: Vec<String>,
    windows: Vec<WindowExport<'a>>,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    // Inputs
    source: Box<dyn MessageSource>,
    pub session: Session,
    pub source_error: Option<String>,
    pub last_message: Option<Instant>,

    // Alert presentation
    pub alerts: AlertQueue,
    pub flash: FlashVibrator,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App.
    ///
    /// `alerts` and `flash` must be the surface and vibrator the session's
    /// dispatcher was built with, so alerts show up in this UI.
    pub fn new(
        source: Box<dyn MessageSource>,
        session: Session,
        alerts: AlertQueue,
        flash: FlashVibrator,
        theme: Theme,
    ) -> Self {
        Self {
            running: true,
            current_view: View::All,
            show_help: false,
            source,
            session,
            source_error: None,
            last_message: None,
            alerts,
            flash,
            theme,
            status_message: None,
        }
    }

    /// Returns a description of the current message source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < STATUS_MESSAGE_TTL => Some(msg),
            _ => None,
        }
    }

    /// Drain pending messages from the source into the session.
    ///
    /// Returns how many messages were handled this tick.
    pub fn pump_messages(&mut self) -> usize {
        let mut handled = 0;
        while handled < MAX_MESSAGES_PER_TICK {
            let Some(message) = self.source.poll() else {
                break;
            };
            self.session.on_message(&message.topic, &message.payload);
            handled += 1;
        }
        if handled > 0 {
            self.last_message = Some(Instant::now());
        }
        self.source_error = self.source.error();
        handled
    }

    /// The alert currently shown in the overlay, if any.
    pub fn current_alert(&self) -> Option<PendingAlert> {
        self.alerts.front()
    }

    /// Dismiss the front alert. Returns false if none was pending.
    pub fn dismiss_alert(&mut self) -> bool {
        self.alerts.dismiss().is_some()
    }

    /// Whether the alert pulse is currently in an "on" step.
    pub fn is_flashing(&self) -> bool {
        self.flash.is_active()
    }

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Stop the source and release session resources.
    pub fn shutdown(&mut self) {
        self.source.end();
        self.session.shutdown();
    }

    /// Export the current sample windows to a JSON file.
    pub fn export_state(&self, path: &Path) -> anyhow::Result<()> {
        let windows = self.session.windows();
        let export = StateExport {
            source: self.source.description(),
            message_count: self.session.message_count(),
            alert_count: self.session.alert_count(),
            pending_alerts: self.alerts.snapshot().into_iter().map(|a| a.message).collect(),
            windows: Metric::ALL
                .into_iter()
                .map(|metric| WindowExport {
                    metric,
                    unit: metric.unit(),
                    values: windows.get(metric).to_vec(),
                })
                .collect(),
        };

        let json = serde_json::to_string_pretty(&export)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::notify::sound::tests::CountingLoader;
    use crate::notify::{AlertDispatcher, SoundHandle};
    use crate::source::{ChannelSource, InboundMessage};
    use crate::topics::{TOPIC_ALERT, TOPIC_HUMIDITY, TOPIC_TEMPERATURE};
    use std::sync::Arc;
    use tokio::runtime::Handle;
    use tokio::sync::mpsc;

    /// An app fed by a channel, with a counting sound and a flash vibrator.
    pub(crate) fn test_app() -> (mpsc::Sender<InboundMessage>, App) {
        let (tx, source) = ChannelSource::create("test");
        let alerts = AlertQueue::new();
        let flash = FlashVibrator::new();
        let dispatcher = AlertDispatcher::new(
            Box::new(alerts.clone()),
            SoundHandle::new(Box::new(CountingLoader::default())),
            Arc::new(flash.clone()),
            Handle::current(),
        );
        let app = App::new(
            Box::new(source),
            Session::new(dispatcher),
            alerts,
            flash,
            Theme::dark(),
        );
        (tx, app)
    }

    #[test]
    fn test_view_cycle() {
        let mut view = View::All;
        for expected in ["Temperature", "Humidity", "Sound", "All"] {
            view = view.next();
            assert_eq!(view.label(), expected);
        }
        assert_eq!(View::All.prev(), View::Metric(Metric::Sound));
        assert_eq!(View::from_index(2), Some(View::Metric(Metric::Humidity)));
        assert_eq!(View::from_index(4), None);
    }

    #[tokio::test]
    async fn test_pump_messages_feeds_session() {
        let (tx, mut app) = test_app();
        tx.send(InboundMessage::new(TOPIC_TEMPERATURE, "21.5")).await.unwrap();
        tx.send(InboundMessage::new(TOPIC_HUMIDITY, "oops")).await.unwrap();
        tx.send(InboundMessage::new(TOPIC_ALERT, "Fire detected")).await.unwrap();

        assert_eq!(app.pump_messages(), 3);
        assert_eq!(app.session.message_count(), 3);
        assert_eq!(app.session.windows().get(Metric::Temperature).to_vec(), vec![21.5]);
        assert!(app.session.windows().get(Metric::Humidity).is_empty());
        assert_eq!(app.current_alert().unwrap().message, "Fire detected");
        assert!(app.last_message.is_some());

        assert_eq!(app.pump_messages(), 0);
    }

    #[tokio::test]
    async fn test_source_error_surfaces() {
        let (tx, mut app) = test_app();
        drop(tx);
        app.pump_messages();
        assert_eq!(app.source_error.as_deref(), Some("Channel closed"));
    }

    #[tokio::test]
    async fn test_dismiss_alerts_in_order() {
        let (tx, mut app) = test_app();
        tx.send(InboundMessage::new(TOPIC_ALERT, "first")).await.unwrap();
        tx.send(InboundMessage::new(TOPIC_ALERT, "second")).await.unwrap();
        app.pump_messages();

        assert_eq!(app.current_alert().unwrap().message, "first");
        assert!(app.dismiss_alert());
        assert_eq!(app.current_alert().unwrap().message, "second");
        assert!(app.dismiss_alert());
        assert!(!app.dismiss_alert());
    }

    #[tokio::test]
    async fn test_export_state() {
        let (tx, mut app) = test_app();
        for v in ["20", "21"] {
            tx.send(InboundMessage::new(TOPIC_TEMPERATURE, v)).await.unwrap();
        }
        app.pump_messages();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        app.export_state(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["source"], "channel: test");
        assert_eq!(json["message_count"], 2);
        assert_eq!(json["windows"][0]["metric"], "temperature");
        assert_eq!(json["windows"][0]["values"], serde_json::json!([20.0, 21.0]));
        assert_eq!(json["windows"][2]["values"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_status_message_expires() {
        let (_tx, mut app) = test_app();

        app.set_status_message("Exported".to_string());
        assert_eq!(app.get_status_message(), Some("Exported"));

        app.status_message = Some(("old".to_string(), Instant::now() - STATUS_MESSAGE_TTL));
        assert!(app.get_status_message().is_none());
    }
}
