//! Stream-based message source.
//!
//! Reads newline-delimited `<topic> <payload>` records from an async reader.
//! This is the format produced by `mosquitto_sub -v`, so a capture can be
//! replayed through the dashboard:
//!
//! ```text
//! esp32/sensor/temperatura 23.5
//! esp32/sensor/umidade 61
//! esp32/alertas ALERT: high noise (average 512.0)
//! ```

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{InboundMessage, MessageSource};

/// A message source that reads recorded messages from an async stream.
///
/// # Example with a byte stream
///
/// ```
/// use std::io::Cursor;
/// use std::time::Duration;
/// use sensorwatch::StreamSource;
///
/// # tokio_test::block_on(async {
/// let data = b"esp32/sensor/som 512\n";
/// let stream = Cursor::new(data.to_vec());
/// let source = StreamSource::spawn(stream, "example", Duration::ZERO);
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<InboundMessage>,
    description: String,
    last_error: Arc<Mutex<Option<String>>>,
    task: JoinHandle<()>,
}

/// Split a record into topic and payload at the first whitespace.
///
/// Returns `None` for blank lines and `#` comments.
pub fn parse_record(line: &str) -> Option<InboundMessage> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.starts_with('#') {
        return None;
    }

    let (topic, payload) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    Some(InboundMessage::new(topic.to_string(), Bytes::from(payload.to_string())))
}

impl StreamSource {
    /// Spawn a background task that reads records from the given reader,
    /// waiting `interval` between records.
    pub fn spawn<R>(reader: R, description: &str, interval: Duration) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(16);
        let last_error = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();

        let task = tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        *error_handle.lock() = Some("End of stream".to_string());
                        break;
                    }
                    Ok(_) => {
                        let Some(message) = parse_record(&line) else {
                            continue;
                        };
                        debug!(topic = %message.topic, "Replaying record");
                        if tx.send(message).await.is_err() {
                            // Receiver dropped
                            break;
                        }
                        if !interval.is_zero() {
                            tokio::time::sleep(interval).await;
                        }
                    }
                    Err(e) => {
                        *error_handle.lock() = Some(format!("Read error: {}", e));
                        break;
                    }
                }
            }
        });

        Self {
            receiver: rx,
            description: format!("stream: {}", description),
            last_error,
            task,
        }
    }
}

impl MessageSource for StreamSource {
    fn poll(&mut self) -> Option<InboundMessage> {
        self.receiver.try_recv().ok()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    fn end(&mut self) {
        self.task.abort();
        self.receiver.close();
    }
}
