//! Threshold alarm publisher.
//!
//! Watches the sensor topics, averages readings in small batches and
//! publishes a human-readable alert on [`TOPIC_ALERT`] when an average
//! crosses a threshold. Each condition has its own cooldown so a sustained
//! excursion does not flood the dashboard.
//!
//! The sound sensor is an analog KY-037 module: *lower* readings mean a
//! louder environment, so the noise alarm fires below its threshold.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use anyhow::Result;
use rumqttc::{MqttOptions, QoS};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::data::{parse_reading, Metric};
use crate::error::SourceError;
use crate::source::{MessageSource, MqttSource};
use crate::topics::{TOPIC_ALERT, TOPIC_SENSOR_WILDCARD};

/// Alarm limits and batching.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    /// Average temperature above this (°C) raises an alarm.
    pub temp_max: f64,
    /// Average temperature below this (°C) raises an alarm.
    pub temp_min: f64,
    /// Average humidity above this (%) raises an alarm.
    pub humidity_max: f64,
    /// Average analog sound level below this raises an alarm.
    pub sound_threshold: f64,
    /// Readings averaged per evaluation.
    pub accumulate_count: usize,
    /// Minimum time between two alarms for the same condition.
    pub cooldown: Duration,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temp_max: 30.0,
            temp_min: 10.0,
            humidity_max: 80.0,
            sound_threshold: 700.0,
            accumulate_count: 2,
            cooldown: Duration::from_secs(120),
        }
    }
}

/// An alarm condition. Cooldowns are tracked per condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    HighTemperature,
    LowTemperature,
    HighHumidity,
    HighNoise,
}

/// A triggered alarm.
#[derive(Debug, Clone, PartialEq)]
pub struct Alarm {
    pub condition: Condition,
    pub average: f64,
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.condition {
            Condition::HighTemperature => {
                write!(f, "ALERT: high temperature (average {:.1} °C)", self.average)
            }
            Condition::LowTemperature => {
                write!(f, "ALERT: low temperature (average {:.1} °C)", self.average)
            }
            Condition::HighHumidity => {
                write!(f, "ALERT: excessive humidity (average {:.1}%)", self.average)
            }
            Condition::HighNoise => write!(f, "ALERT: high noise (average {:.1})", self.average),
        }
    }
}

/// Batch averaging and cooldown bookkeeping, free of I/O.
#[derive(Debug)]
pub struct AlarmMonitor {
    thresholds: Thresholds,
    batches: HashMap<Metric, Vec<f64>>,
    last_fired: HashMap<Condition, Instant>,
}

impl AlarmMonitor {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            batches: HashMap::new(),
            last_fired: HashMap::new(),
        }
    }

    /// Feed one raw reading received at `now`.
    ///
    /// Returns an alarm when this reading completes a batch whose average
    /// crosses a threshold outside that condition's cooldown.
    pub fn observe(&mut self, metric: Metric, payload: &str, now: Instant) -> Option<Alarm> {
        let Some(value) = parse_value(metric, payload) else {
            debug!(?metric, payload, "Ignoring unparseable reading");
            return None;
        };

        let count = self.thresholds.accumulate_count.max(1);
        let batch = self.batches.entry(metric).or_default();
        batch.push(value);
        if batch.len() > count {
            batch.remove(0);
        }
        debug!(?metric, value, pending = batch.len(), of = count, "Reading accumulated");
        if batch.len() < count {
            return None;
        }

        let average = batch.iter().sum::<f64>() / batch.len() as f64;
        batch.clear();
        debug!(?metric, average, "Batch complete");

        let t = &self.thresholds;
        let candidates: &[(Condition, bool)] = match metric {
            Metric::Temperature => &[
                (Condition::HighTemperature, average > t.temp_max),
                (Condition::LowTemperature, average < t.temp_min),
            ],
            Metric::Humidity => &[(Condition::HighHumidity, average > t.humidity_max)],
            Metric::Sound => &[(Condition::HighNoise, average < t.sound_threshold)],
        };

        let condition = candidates
            .iter()
            .filter(|(_, crossed)| *crossed)
            .map(|(condition, _)| *condition)
            .find(|condition| self.cooled_down(*condition, now))?;

        self.last_fired.insert(condition, now);
        Some(Alarm { condition, average })
    }

    fn cooled_down(&self, condition: Condition, now: Instant) -> bool {
        self.last_fired
            .get(&condition)
            .map_or(true, |last| now.saturating_duration_since(*last) >= self.thresholds.cooldown)
    }
}

/// Sound levels are integer ADC counts; the other metrics are decimals.
fn parse_value(metric: Metric, payload: &str) -> Option<f64> {
    match metric {
        Metric::Sound => payload.trim().parse::<i64>().ok().map(|v| v as f64),
        _ => parse_reading(payload),
    }
}

/// Subscribe to the sensor topics and publish alarms until Ctrl-C.
pub async fn run(options: MqttOptions, thresholds: Thresholds) -> Result<()> {
    let mut source = MqttSource::spawn(options, &[TOPIC_SENSOR_WILDCARD], &Handle::current());
    let mut monitor = AlarmMonitor::new(thresholds);
    info!(source = source.description(), "Monitoring sensor readings");

    loop {
        let message = tokio::select! {
            message = source.recv() => message,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
        };
        let Some(message) = message else {
            break;
        };

        let Some(metric) = Metric::from_topic(&message.topic) else {
            debug!(topic = %message.topic, "Ignoring topic");
            continue;
        };
        let payload = String::from_utf8_lossy(&message.payload);
        let Some(alarm) = monitor.observe(metric, &payload, Instant::now()) else {
            continue;
        };

        let text = alarm.to_string();
        info!(alert = %text, "Publishing alert");
        if let Err(e) = source
            .client()
            .publish(TOPIC_ALERT, QoS::AtMostOnce, false, text.into_bytes())
            .await
            .map_err(SourceError::from)
        {
            warn!(error = %e, "Failed to publish alert");
        }
    }

    source.end();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> AlarmMonitor {
        AlarmMonitor::new(Thresholds::default())
    }

    #[test]
    fn test_needs_full_batch() {
        let mut m = monitor();
        let now = Instant::now();
        assert!(m.observe(Metric::Temperature, "35", now).is_none());

        let alarm = m.observe(Metric::Temperature, "33", now).unwrap();
        assert_eq!(alarm.condition, Condition::HighTemperature);
        assert_eq!(alarm.average, 34.0);
        assert_eq!(alarm.to_string(), "ALERT: high temperature (average 34.0 °C)");
    }

    #[test]
    fn test_batch_cleared_after_evaluation() {
        let mut m = monitor();
        let now = Instant::now();
        m.observe(Metric::Humidity, "50", now);
        assert!(m.observe(Metric::Humidity, "50", now).is_none());

        // A fresh batch is needed; a single high reading is not enough.
        assert!(m.observe(Metric::Humidity, "95", now).is_none());
        let alarm = m.observe(Metric::Humidity, "95", now).unwrap();
        assert_eq!(alarm.condition, Condition::HighHumidity);
        assert_eq!(alarm.to_string(), "ALERT: excessive humidity (average 95.0%)");
    }

    #[test]
    fn test_average_within_limits() {
        let mut m = monitor();
        let now = Instant::now();
        // 40 and 12 average to 26: no alarm even though one reading is high.
        m.observe(Metric::Temperature, "40", now);
        assert!(m.observe(Metric::Temperature, "12", now).is_none());
    }

    #[test]
    fn test_low_temperature() {
        let mut m = monitor();
        let now = Instant::now();
        m.observe(Metric::Temperature, "8", now);
        let alarm = m.observe(Metric::Temperature, "9", now).unwrap();
        assert_eq!(alarm.condition, Condition::LowTemperature);
        assert_eq!(alarm.to_string(), "ALERT: low temperature (average 8.5 °C)");
    }

    #[test]
    fn test_cooldown_per_condition() {
        let mut m = monitor();
        let start = Instant::now();

        m.observe(Metric::Temperature, "31", start);
        assert!(m.observe(Metric::Temperature, "31", start).is_some());

        // Same condition inside the cooldown is suppressed.
        let later = start + Duration::from_secs(60);
        m.observe(Metric::Temperature, "31", later);
        assert!(m.observe(Metric::Temperature, "31", later).is_none());

        // A different condition has its own cooldown.
        m.observe(Metric::Temperature, "5", later);
        assert_eq!(
            m.observe(Metric::Temperature, "5", later).unwrap().condition,
            Condition::LowTemperature
        );

        // After the cooldown the original condition fires again.
        let after = start + Duration::from_secs(120);
        m.observe(Metric::Temperature, "31", after);
        assert!(m.observe(Metric::Temperature, "31", after).is_some());
    }

    #[test]
    fn test_sound_fires_below_threshold() {
        let mut m = monitor();
        let now = Instant::now();
        m.observe(Metric::Sound, "500", now);
        let alarm = m.observe(Metric::Sound, "525", now).unwrap();
        assert_eq!(alarm.condition, Condition::HighNoise);
        assert_eq!(alarm.to_string(), "ALERT: high noise (average 512.5)");

        m.observe(Metric::Sound, "900", now);
        assert!(m.observe(Metric::Sound, "950", now).is_none());
    }

    #[test]
    fn test_sound_requires_integers() {
        let mut m = monitor();
        let now = Instant::now();
        assert!(m.observe(Metric::Sound, "512.5", now).is_none());
        assert!(m.observe(Metric::Sound, "loud", now).is_none());
        // Neither reading was accumulated.
        assert!(m.observe(Metric::Sound, "100", now).is_none());
        assert!(m.observe(Metric::Sound, "100", now).is_some());
    }

    #[test]
    fn test_metrics_batch_independently() {
        let mut m = monitor();
        let now = Instant::now();
        m.observe(Metric::Temperature, "35", now);
        assert!(m.observe(Metric::Humidity, "99", now).is_none());
        assert!(m.observe(Metric::Temperature, "35", now).is_some());
    }

    #[test]
    fn test_single_reading_batches() {
        let mut m = AlarmMonitor::new(Thresholds {
            accumulate_count: 1,
            ..Thresholds::default()
        });
        assert!(m.observe(Metric::Humidity, "81", Instant::now()).is_some());
    }
}
