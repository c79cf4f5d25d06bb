//! Message source abstraction for receiving sensor messages.
//!
//! This module provides a trait-based abstraction over where inbound
//! `(topic, payload)` messages come from: a live MQTT broker, a recorded
//! replay file, or an in-memory channel.

mod channel;
mod mqtt;
mod stream;

pub use channel::ChannelSource;
pub use mqtt::{ConnectionState, MqttSource};
pub use stream::StreamSource;

use std::fmt::Debug;

use bytes::Bytes;

/// One message delivered by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Bytes,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Trait for receiving sensor messages from various sources.
///
/// # Example
///
/// ```
/// use sensorwatch::{ChannelSource, MessageSource};
///
/// # tokio_test::block_on(async {
/// let (tx, mut source) = ChannelSource::create("test");
/// tx.send(sensorwatch::InboundMessage::new("esp32/sensor/som", "512")).await.unwrap();
/// while let Some(message) = source.poll() {
///     println!("{}: {:?}", message.topic, message.payload);
/// }
/// # });
/// ```
pub trait MessageSource: Send + Debug {
    /// Take the next pending message, if any.
    ///
    /// Must not block; the UI loop calls it every tick.
    fn poll(&mut self) -> Option<InboundMessage>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// Current problem with the source, if any (e.g. broker unreachable).
    fn error(&self) -> Option<String>;

    /// Disconnect and stop background work. Further polls return `None`.
    fn end(&mut self) {}
}
