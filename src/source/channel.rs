//! Channel-based message source.
//!
//! Receives messages via a tokio mpsc channel. This is useful for embedding
//! the dashboard in another program, or for tests, where messages are pushed
//! rather than received from a broker.

use tokio::sync::mpsc;

use super::{InboundMessage, MessageSource};

/// Buffered messages before senders start waiting.
const CHANNEL_CAPACITY: usize = 256;

/// A message source fed through an in-memory channel.
///
/// # Example
///
/// ```
/// use sensorwatch::ChannelSource;
///
/// // Create a channel pair
/// let (tx, source) = ChannelSource::create("bridge");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<InboundMessage>,
    description: String,
    disconnected: bool,
}

impl ChannelSource {
    /// Create a new channel source.
    ///
    /// # Arguments
    ///
    /// * `receiver` - The receiving end of an mpsc channel
    /// * `source_description` - Where messages come from, for the status bar
    pub fn new(receiver: mpsc::Receiver<InboundMessage>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            disconnected: false,
        }
    }

    /// Create a channel pair for sending messages to a ChannelSource.
    pub fn create(source_description: &str) -> (mpsc::Sender<InboundMessage>, Self) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        (tx, Self::new(rx, source_description))
    }
}

impl MessageSource for ChannelSource {
    fn poll(&mut self) -> Option<InboundMessage> {
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.disconnected = true;
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.disconnected.then(|| "Channel closed".to_string())
    }

    fn end(&mut self) {
        self.receiver.close();
    }
}
