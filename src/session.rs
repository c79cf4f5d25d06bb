//! Per-session dashboard state.
//!
//! A [`Session`] owns the three sample windows and the alert dispatcher. It is
//! created when the dashboard starts and torn down when it exits; dropping it
//! releases the alert sound even if [`Session::shutdown`] was never called.

use tracing::{debug, warn};

use crate::data::{parse_reading, Metric, SampleWindows};
use crate::notify::AlertDispatcher;
use crate::topics::{self, Route};

/// What happened to an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Appended to the metric's window.
    Recorded(Metric),
    /// Not a finite number; the window is unchanged.
    Discarded(Metric),
    /// Forwarded to the alert dispatcher.
    Alerted,
    /// Topic not handled by the dashboard.
    Ignored,
}

/// Sample windows plus alert dispatch for one dashboard session.
#[derive(Debug)]
pub struct Session {
    windows: SampleWindows,
    dispatcher: AlertDispatcher,
    message_count: u64,
    alert_count: u64,
    closed: bool,
}

impl Session {
    /// Start a session with empty windows and begin preloading the alert sound.
    pub fn new(dispatcher: AlertDispatcher) -> Self {
        dispatcher.preload();
        Self {
            windows: SampleWindows::new(),
            dispatcher,
            message_count: 0,
            alert_count: 0,
            closed: false,
        }
    }

    /// Handle one inbound message. Never fails; bad payloads are logged and dropped.
    pub fn on_message(&mut self, topic: &str, payload: &[u8]) -> Outcome {
        self.message_count += 1;
        let text = String::from_utf8_lossy(payload);
        debug!(topic, payload = %text, "Message received");

        match topics::route(topic) {
            Route::Sample(metric) => match parse_reading(&text) {
                Some(value) if self.windows.record(metric, value) => Outcome::Recorded(metric),
                _ => {
                    warn!(topic, payload = %text, "Discarding non-numeric reading");
                    Outcome::Discarded(metric)
                }
            },
            Route::Alert => {
                self.alert_count += 1;
                self.dispatcher.on_alert(&text);
                Outcome::Alerted
            }
            Route::Ignored => {
                debug!(topic, "Ignoring message on unknown topic");
                Outcome::Ignored
            }
        }
    }

    pub fn windows(&self) -> &SampleWindows {
        &self.windows
    }

    pub fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }

    /// Messages handled so far, including discarded and ignored ones.
    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    pub fn alert_count(&self) -> u64 {
        self.alert_count
    }

    /// Release session resources. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if !self.closed {
            self.closed = true;
            self.dispatcher.shutdown();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}
