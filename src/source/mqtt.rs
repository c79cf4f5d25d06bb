//! MQTT broker source.
//!
//! Owns a rumqttc client and drives its event loop in a background task.
//! Subscriptions are (re)issued on every successful CONNACK, so they survive
//! broker restarts without session persistence. Reconnection itself is left
//! to rumqttc: after an error the next `poll()` reconnects.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
    SubscribeFilter,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{InboundMessage, MessageSource};
use crate::error::SourceError;

/// Capacity of the rumqttc request channel.
const REQUEST_CAPACITY: usize = 16;
/// Buffered inbound messages before the event loop waits on the UI.
const INBOUND_CAPACITY: usize = 256;
/// Pause after a connection error before rumqttc reconnects.
const RETRY_DELAY: Duration = Duration::from_secs(1);
/// How long `end` lets the event loop flush the DISCONNECT before aborting it.
const DISCONNECT_GRACE: Duration = Duration::from_millis(250);

/// Broker connection status as seen by the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected(String),
}

/// A message source backed by a live MQTT subscription.
pub struct MqttSource {
    client: AsyncClient,
    receiver: mpsc::Receiver<InboundMessage>,
    state: Arc<Mutex<ConnectionState>>,
    description: String,
    runtime: Handle,
    task: Option<JoinHandle<()>>,
}

impl MqttSource {
    /// Connect with `options` and subscribe to `topics` once the broker accepts.
    pub fn spawn(options: MqttOptions, topics: &[&str], runtime: &Handle) -> Self {
        let (host, port) = options.broker_address();
        let description = format!("mqtt: {}:{}", host, port);

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let (tx, receiver) = mpsc::channel(INBOUND_CAPACITY);
        let state = Arc::new(Mutex::new(ConnectionState::Connecting));
        let filters: Vec<SubscribeFilter> = topics
            .iter()
            .map(|t| SubscribeFilter::new(t.to_string(), QoS::AtMostOnce))
            .collect();

        info!(broker = %description, "Connecting to MQTT broker");
        let task = runtime.spawn(run_event_loop(
            event_loop,
            client.clone(),
            filters,
            tx,
            state.clone(),
        ));

        Self {
            client,
            receiver,
            state,
            description,
            runtime: runtime.clone(),
            task: Some(task),
        }
    }

    /// Client handle for publishing on the same connection.
    pub fn client(&self) -> &AsyncClient {
        &self.client
    }

    pub fn state(&self) -> ConnectionState {
        self.state.lock().clone()
    }

    /// Wait for the next message. Returns `None` once the source has ended.
    pub async fn recv(&mut self) -> Option<InboundMessage> {
        self.receiver.recv().await
    }
}

async fn run_event_loop(
    mut event_loop: EventLoop,
    client: AsyncClient,
    filters: Vec<SubscribeFilter>,
    tx: mpsc::Sender<InboundMessage>,
    state: Arc<Mutex<ConnectionState>>,
) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    info!(session_present = ack.session_present, "Connected to MQTT broker");
                    *state.lock() = ConnectionState::Connected;
                    if let Err(e) = client.try_subscribe_many(filters.clone()) {
                        error!(error = %SourceError::from(e), "Failed to subscribe");
                    }
                } else {
                    warn!(code = ?ack.code, "MQTT broker rejected connection");
                    *state.lock() =
                        ConnectionState::Disconnected(format!("Rejected: {:?}", ack.code));
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let message = InboundMessage {
                    topic: publish.topic,
                    payload: publish.payload,
                };
                if tx.send(message).await.is_err() {
                    // Receiver dropped
                    break;
                }
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                info!("Broker closed the connection");
                *state.lock() = ConnectionState::Disconnected("Closed by broker".to_string());
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                info!("Disconnected from MQTT broker");
                *state.lock() = ConnectionState::Disconnected("Disconnected".to_string());
                break;
            }
            Ok(notification) => {
                debug!(?notification, "MQTT notification");
            }
            Err(e) => {
                let err = SourceError::Connection(e.to_string());
                warn!(error = %err, "MQTT connection error");
                *state.lock() = ConnectionState::Disconnected(err.to_string());
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
}

impl MessageSource for MqttSource {
    fn poll(&mut self) -> Option<InboundMessage> {
        self.receiver.try_recv().ok()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        match &*self.state.lock() {
            ConnectionState::Connecting => Some("Connecting...".to_string()),
            ConnectionState::Connected => None,
            ConnectionState::Disconnected(reason) => Some(reason.clone()),
        }
    }

    /// Send DISCONNECT and stop the event loop.
    ///
    /// Outside the runtime (the dashboard's main thread) this waits up to
    /// [`DISCONNECT_GRACE`] for the packet to be flushed. Inside it, the wait
    /// happens in a spawned task. Either way the loop is aborted if the
    /// broker never takes the packet.
    fn end(&mut self) {
        let Some(mut task) = self.task.take() else {
            return;
        };
        if let Err(e) = self.client.try_disconnect() {
            debug!(error = %e, "Disconnect request not delivered");
        }

        if Handle::try_current().is_ok() {
            self.runtime.spawn(async move {
                if tokio::time::timeout(DISCONNECT_GRACE, &mut task).await.is_err() {
                    debug!("MQTT event loop still running after disconnect, aborting");
                    task.abort();
                }
            });
        } else {
            let flushed = self
                .runtime
                .block_on(tokio::time::timeout(DISCONNECT_GRACE, &mut task));
            if flushed.is_err() {
                debug!("MQTT event loop still running after disconnect, aborting");
                task.abort();
            }
        }
        self.receiver.close();
    }
}

impl Drop for MqttSource {
    fn drop(&mut self) {
        self.end();
    }
}

impl fmt::Debug for MqttSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttSource")
            .field("description", &self.description)
            .field("state", &*self.state.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    const CONNECT: u8 = 0x10;
    const DISCONNECT: u8 = 0xE0;

    /// Read one MQTT packet and return its first header byte.
    async fn read_packet_kind(socket: &mut TcpStream) -> Option<u8> {
        let kind = socket.read_u8().await.ok()?;
        let mut len = 0usize;
        let mut shift = 0;
        loop {
            let byte = socket.read_u8().await.ok()?;
            len |= usize::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        let mut body = vec![0; len];
        socket.read_exact(&mut body).await.ok()?;
        Some(kind)
    }

    fn unreachable_options() -> MqttOptions {
        // Port 1 is never a broker; connections are refused immediately.
        MqttOptions::new("sensorwatch-test", "127.0.0.1", 1)
    }

    #[tokio::test]
    async fn test_description() {
        let source = MqttSource::spawn(unreachable_options(), &["a/b"], &Handle::current());
        assert_eq!(source.description(), "mqtt: 127.0.0.1:1");
    }

    #[tokio::test]
    async fn test_unreachable_broker_reports_error() {
        let mut source = MqttSource::spawn(unreachable_options(), &["a/b"], &Handle::current());

        for _ in 0..100 {
            if matches!(source.state(), ConnectionState::Disconnected(_)) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(matches!(source.state(), ConnectionState::Disconnected(_)));
        assert!(source.error().is_some());
        assert!(source.poll().is_none());
    }

    #[tokio::test]
    async fn test_end_is_idempotent() {
        let mut source = MqttSource::spawn(unreachable_options(), &["a/b"], &Handle::current());
        source.end();
        source.end();
        assert!(source.poll().is_none());
        assert!(source.recv().await.is_none());
    }

    #[test]
    fn test_end_flushes_disconnect() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let listener = rt.block_on(TcpListener::bind("127.0.0.1:0")).unwrap();
        let port = listener.local_addr().unwrap().port();

        // Minimal broker: accept the CONNECT, then record packets until DISCONNECT.
        let broker = rt.spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            assert_eq!(read_packet_kind(&mut socket).await, Some(CONNECT));
            socket.write_all(&[0x20, 0x02, 0x00, 0x00]).await.unwrap();

            let mut seen = Vec::new();
            while let Some(kind) = read_packet_kind(&mut socket).await {
                seen.push(kind);
                if kind == DISCONNECT {
                    break;
                }
            }
            seen
        });

        let options = MqttOptions::new("sensorwatch-test", "127.0.0.1", port);
        let mut source = MqttSource::spawn(options, &["a/b"], rt.handle());
        for _ in 0..200 {
            if source.state() == ConnectionState::Connected {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(source.state(), ConnectionState::Connected);

        source.end();

        let seen = rt.block_on(broker).unwrap();
        assert_eq!(seen.last(), Some(&DISCONNECT));
        assert_eq!(
            source.state(),
            ConnectionState::Disconnected("Disconnected".to_string())
        );
    }
}
