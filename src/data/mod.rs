//! Sensor data models.
//!
//! ## Submodules
//!
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "120s", "500ms")
//! - [`window`]: The bounded [`SampleWindow`] holding the last readings of one metric
//!
//! ## Data Flow
//!
//! ```text
//! payload bytes
//!        │
//!        ▼
//! parse_reading() ── None ──▶ discarded (logged by the session)
//!        │ Some(f64)
//!        ▼
//! SampleWindows::record(metric, value)
//!        │
//!        └──▶ ui::charts (full re-render every frame)
//! ```

pub mod duration;
pub mod window;

pub use window::{SampleWindow, WINDOW_CAPACITY};

use serde::Serialize;

use crate::topics::{TOPIC_HUMIDITY, TOPIC_SOUND, TOPIC_TEMPERATURE};

/// A numeric quantity reported by the sensor device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Temperature,
    Humidity,
    Sound,
}

impl Metric {
    /// All metrics in display order.
    pub const ALL: [Metric; 3] = [Metric::Temperature, Metric::Humidity, Metric::Sound];

    /// Chart title.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature (°C)",
            Metric::Humidity => "Humidity (%)",
            Metric::Sound => "Sound",
        }
    }

    /// Suffix appended to axis labels and values.
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Humidity => "%",
            Metric::Sound => "",
        }
    }

    /// The topic this metric is published on.
    pub fn topic(&self) -> &'static str {
        match self {
            Metric::Temperature => TOPIC_TEMPERATURE,
            Metric::Humidity => TOPIC_HUMIDITY,
            Metric::Sound => TOPIC_SOUND,
        }
    }

    pub fn from_topic(topic: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.topic() == topic)
    }

    fn index(self) -> usize {
        match self {
            Metric::Temperature => 0,
            Metric::Humidity => 1,
            Metric::Sound => 2,
        }
    }
}

/// Parse a payload as a finite reading.
///
/// Surrounding whitespace is ignored. Returns `None` for anything that is not
/// a finite decimal number, including "NaN" and "inf".
pub fn parse_reading(payload: &str) -> Option<f64> {
    payload.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// One [`SampleWindow`] per [`Metric`].
#[derive(Debug, Clone, Default)]
pub struct SampleWindows {
    windows: [SampleWindow; 3],
}

impl SampleWindows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, metric: Metric) -> &SampleWindow {
        &self.windows[metric.index()]
    }

    /// Append a reading to the metric's window. Returns `false` if rejected.
    pub fn record(&mut self, metric: Metric, value: f64) -> bool {
        self.windows[metric.index()].push(value)
    }

    /// Iterate `(metric, window)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, &SampleWindow)> {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }

    /// Total readings held across all windows.
    pub fn total_len(&self) -> usize {
        self.windows.iter().map(SampleWindow::len).sum()
    }
}
