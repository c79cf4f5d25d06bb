//! # sensorwatch
//!
//! A terminal dashboard and library for watching an ESP32 sensor node over
//! MQTT.
//!
//! The device publishes temperature, humidity and sound readings plus
//! free-text alerts. The dashboard keeps the last
//! [`WINDOW_CAPACITY`](data::WINDOW_CAPACITY) readings of each metric in a
//! sliding window, draws them as line charts, and turns every alert into a
//! modal, a sound and a flash pulse. A companion `alarm` mode evaluates the
//! readings against thresholds and publishes those alerts.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │  app    │───▶│ session  │───▶│   ui    │───▶│ Terminal│ │
//! │  │ (state) │    │(windows) │    │(charts) │    │         │ │
//! │  └────┬────┘    └────┬─────┘    └─────────┘    └─────────┘ │
//! │       │              │ alerts                               │
//! │       ▼              ▼                                      │
//! │  ┌─────────┐    ┌──────────┐                                │
//! │  │ source  │    │  notify  │──▶ overlay, sound, pulse       │
//! │  │ (input) │    └──────────┘                                │
//! │  └─────────┘◀── MqttSource | StreamSource | ChannelSource   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Message source abstraction ([`MessageSource`] trait) with
//!   implementations for a live MQTT broker, recorded replays and channels
//! - **[`session`]**: Per-session state; routes each message to a sample
//!   window or the alert dispatcher
//! - **[`data`]**: Metrics, payload parsing and the bounded [`SampleWindow`]
//! - **[`notify`]**: Alert dispatch, the scoped [`SoundHandle`] and the pulse
//!   pattern
//! - **[`alarm`]**: Threshold evaluation and alert publishing
//! - **[`ui`]**: Terminal rendering using ratatui
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Dashboard against a local broker
//! sensorwatch --broker mqtt://192.168.0.127:1883
//!
//! # Replay a `mosquitto_sub -v` capture
//! sensorwatch --replay capture.txt
//!
//! # Publish threshold alerts
//! sensorwatch alarm --broker mqtt://192.168.0.127:1883
//! ```
//!
//! ### As a library with a channel source
//!
//! ```
//! use std::sync::Arc;
//! use sensorwatch::{
//!     AlertDispatcher, AlertQueue, BellLoader, ChannelSource, MessageSource, NoopVibrator,
//!     Session, SoundHandle,
//! };
//!
//! # tokio_test::block_on(async {
//! let (tx, mut source) = ChannelSource::create("bridge");
//! let alerts = AlertQueue::new();
//! let dispatcher = AlertDispatcher::new(
//!     Box::new(alerts.clone()),
//!     SoundHandle::new(Box::new(BellLoader)),
//!     Arc::new(NoopVibrator),
//!     tokio::runtime::Handle::current(),
//! );
//! let mut session = Session::new(dispatcher);
//!
//! tx.send(sensorwatch::InboundMessage::new("esp32/sensor/umidade", "61")).await.unwrap();
//! while let Some(message) = source.poll() {
//!     session.on_message(&message.topic, &message.payload);
//! }
//! # });
//! ```

pub mod alarm;
pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod logging;
pub mod notify;
pub mod session;
pub mod source;
pub mod topics;
pub mod ui;

// Re-export main types for convenience
pub use alarm::{AlarmMonitor, Thresholds};
pub use app::{App, View};
pub use config::Settings;
pub use data::{Metric, SampleWindow, SampleWindows};
pub use error::{ConfigError, NotifyError, SourceError};
pub use notify::{
    AlertDispatcher, AlertQueue, AlertSurface, BellLoader, CommandLoader, FlashVibrator,
    NoopVibrator, PulsePattern, SoundHandle, SoundLoader, Vibrator,
};
pub use session::{Outcome, Session};
pub use source::{ChannelSource, InboundMessage, MessageSource, MqttSource, StreamSource};
