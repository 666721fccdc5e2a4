//! WebSocket connection lifecycle
//!
//! State machine: `Connecting → Open → Closed → Connecting (retry) → … →
//! ReconnectExhausted`. Only an actual stream closure schedules a
//! reconnect; frame-level errors are logged and reflected in the status
//! channel but do not trigger a second reconnect for the same outage.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use fleet_protocol::{ConsoleFrame, ServerFrame};
use fleet_utils::{ConsoleError, Result};

use super::MessageSender;

/// Connection lifecycle state, published for status display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    /// Terminal: the retry budget is spent; restarting the console is the
    /// only recovery path
    ReconnectExhausted,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Connecting => "connecting",
            Self::Open => "connected",
            Self::Closed => "disconnected, reconnecting",
            Self::ReconnectExhausted => "reconnect failed, restart required",
        };
        write!(f, "{}", text)
    }
}

/// Exponential backoff schedule for reconnect attempts
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            max_attempts: 10,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before retry `attempt` (0-indexed), or `None` once the
    /// budget is spent
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt < self.max_attempts {
            Some(reconnect_delay(self.base_delay, attempt))
        } else {
            None
        }
    }
}

/// Backoff delay for attempt `k` (0-indexed): `base * 2^k`
pub fn reconnect_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
}

/// Receiving side of a running transport
pub struct TransportHandle {
    /// Typed inbound frames, in delivery order
    pub events: mpsc::Receiver<ServerFrame>,
    /// Connection-status updates
    pub status: watch::Receiver<ConnectionState>,
    /// Outbound frame sender
    pub sender: MessageSender,
}

/// The transport task: owns the socket and the reconnect schedule
pub struct Transport {
    url: String,
    policy: ReconnectPolicy,
    events: mpsc::Sender<ServerFrame>,
    status: watch::Sender<ConnectionState>,
    outbound: mpsc::Receiver<ConsoleFrame>,
}

impl Transport {
    /// Create a transport for `url` and the handle used to consume it.
    /// Nothing connects until [`run`](Self::run) is awaited.
    pub fn new(url: impl Into<String>, policy: ReconnectPolicy) -> (Self, TransportHandle) {
        let (events_tx, events_rx) = mpsc::channel(256);
        let (outbound_tx, outbound_rx) = mpsc::channel(64);
        let (status_tx, status_rx) = watch::channel(ConnectionState::Connecting);

        let transport = Self {
            url: url.into(),
            policy,
            events: events_tx,
            status: status_tx,
            outbound: outbound_rx,
        };
        let handle = TransportHandle {
            events: events_rx,
            status: status_rx.clone(),
            sender: MessageSender::new(outbound_tx, status_rx),
        };
        (transport, handle)
    }

    /// Drive the connection until the outbound channel is closed and
    /// drained (`Ok`) or the reconnect budget is spent
    /// (`Err(ReconnectExhausted)`)
    pub async fn run(mut self) -> Result<()> {
        let mut attempt: u32 = 0;

        loop {
            self.status.send_replace(ConnectionState::Connecting);
            tracing::info!(url = %self.url, attempt, "Connecting");

            match connect_async(self.url.as_str()).await {
                Ok((stream, _response)) => {
                    attempt = 0;
                    self.status.send_replace(ConnectionState::Open);
                    tracing::info!("Connection established");

                    if self.pump(stream).await.is_none() {
                        // Outbound side closed and drained; shut down quietly
                        return Ok(());
                    }
                    tracing::warn!("Connection closed");
                    self.status.send_replace(ConnectionState::Closed);
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "Connection attempt failed");
                    self.status.send_replace(ConnectionState::Closed);
                }
            }

            match self.policy.delay_for(attempt) {
                Some(delay) => {
                    tracing::info!(
                        delay_ms = delay.as_millis() as u64,
                        attempt,
                        "Scheduling reconnect"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    tracing::error!(
                        attempts = self.policy.max_attempts,
                        "Reconnect budget spent, giving up"
                    );
                    self.status.send_replace(ConnectionState::ReconnectExhausted);
                    return Err(ConsoleError::ReconnectExhausted {
                        attempts: self.policy.max_attempts,
                    });
                }
            }
        }
    }

    /// Pump one established connection: send the init request, then relay
    /// frames in both directions until the socket closes.
    ///
    /// Returns `Some(())` when the socket closed (reconnect), `None` when
    /// the outbound channel is closed and drained (shut down). Closing the
    /// outbound side only stops the pump after every queued frame has been
    /// written, so a send acknowledged to the caller is never dropped by
    /// shutdown.
    async fn pump(
        &mut self,
        stream: tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    ) -> Option<()> {
        let (mut sink, mut source) = stream.split();

        // Declare interest in the current full state snapshot
        match ConsoleFrame::init().to_json() {
            Ok(json) => {
                if let Err(e) = sink.send(WsMessage::Text(json)).await {
                    tracing::warn!(error = %e, "Failed to send init request");
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to encode init request"),
        }

        loop {
            tokio::select! {
                inbound = source.next() => match inbound {
                    Some(Ok(WsMessage::Text(text))) => match ServerFrame::from_json(&text) {
                        Ok(frame) => {
                            // Shutdown is keyed on the outbound channel, so a
                            // vanished event consumer just stops delivery
                            if self.events.send(frame).await.is_err() {
                                tracing::debug!("Event consumer gone, discarding inbound frame");
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, raw = %text, "Rejected unrecognized frame");
                        }
                    },
                    Some(Ok(WsMessage::Close(_))) | None => return Some(()),
                    Some(Ok(_)) => {
                        // Binary/ping/pong frames carry no console payload
                    }
                    Some(Err(e)) => {
                        // Frame error: status display only; the close that
                        // follows is what schedules the reconnect
                        tracing::warn!(error = %e, "Transport error");
                    }
                },
                outbound = self.outbound.recv() => match outbound {
                    Some(frame) => {
                        match frame.to_json() {
                            Ok(json) => {
                                if let Err(e) = sink.send(WsMessage::Text(json)).await {
                                    tracing::warn!(error = %e, "Failed to send frame");
                                }
                            }
                            Err(e) => tracing::error!(error = %e, "Failed to encode frame"),
                        }
                    }
                    None => return None,
                },
            }
        }
    }
}
