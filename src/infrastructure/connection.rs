// WebSocket connection manager - one logical subscription per feed, always reconnecting
use crate::domain::feed::{ConnectionState, FeedEvent};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub url: String,
    /// Fixed pause between a close and the next attempt
    pub reconnect_interval: Duration,
    pub channel_buffer: usize,
}

impl ConnectionSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_interval: Duration::from_secs(5),
            channel_buffer: 100,
        }
    }

    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    pub fn with_channel_buffer(mut self, size: usize) -> Self {
        self.channel_buffer = size;
        self
    }
}

/// Cheap, cloneable handle to a running connection.
///
/// Dropping every handle shuts the connection down.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    url: Arc<str>,
    state: watch::Receiver<ConnectionState>,
    last_message: watch::Receiver<Option<Value>>,
    outbound: mpsc::UnboundedSender<Value>,
}

impl ConnectionHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Most recent inbound JSON payload, if any has arrived
    pub fn last_message(&self) -> Option<Value> {
        self.last_message.borrow().clone()
    }

    /// Transmit `message` if the connection is open. Otherwise nothing happens:
    /// there is no queue and no error, so callers must not assume delivery.
    pub fn send<T: Serialize>(&self, message: &T) {
        if !self.is_open() {
            tracing::debug!("Not connected to {}, dropping outbound message", self.url);
            return;
        }

        match serde_json::to_value(message) {
            Ok(value) => {
                tracing::debug!("Sending to {}: {}", self.url, value);
                let _ = self.outbound.send(value);
            }
            Err(e) => tracing::warn!("Could not serialize message for {}: {}", self.url, e),
        }
    }
}

#[cfg(test)]
impl ConnectionHandle {
    /// Handle with no socket behind it, for driving owners in tests
    pub fn detached(
        url: &str,
        state: ConnectionState,
    ) -> (Self, watch::Sender<ConnectionState>, mpsc::UnboundedReceiver<Value>) {
        let (state_tx, state_rx) = watch::channel(state);
        let (_last_tx, last_rx) = watch::channel(None);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let handle = Self {
            url: Arc::from(url),
            state: state_rx,
            last_message: last_rx,
            outbound: outbound_tx,
        };
        (handle, state_tx, outbound_rx)
    }
}

pub struct ConnectionManager;

impl ConnectionManager {
    /// Start maintaining a connection to `settings.url`.
    ///
    /// Returns the handle for sending and the receiver for state changes and messages.
    pub fn spawn(settings: ConnectionSettings) -> (ConnectionHandle, mpsc::Receiver<FeedEvent>) {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Closed);
        let (last_tx, last_rx) = watch::channel(None);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(settings.channel_buffer.max(1));

        let handle = ConnectionHandle {
            url: Arc::from(settings.url.as_str()),
            state: state_rx,
            last_message: last_rx,
            outbound: outbound_tx,
        };

        tokio::spawn(async move {
            run_connection(settings, state_tx, last_tx, outbound_rx, event_tx).await;
        });

        (handle, event_rx)
    }
}

/// Record a state change and tell the owner. Returns false once the owner is gone.
async fn transition(
    state_tx: &watch::Sender<ConnectionState>,
    event_tx: &mpsc::Sender<FeedEvent>,
    next: ConnectionState,
) -> bool {
    if *state_tx.borrow() == next {
        return true;
    }
    state_tx.send_replace(next);
    event_tx.send(FeedEvent::StateChanged(next)).await.is_ok()
}

async fn run_connection(
    settings: ConnectionSettings,
    state_tx: watch::Sender<ConnectionState>,
    last_tx: watch::Sender<Option<Value>>,
    mut outbound_rx: mpsc::UnboundedReceiver<Value>,
    event_tx: mpsc::Sender<FeedEvent>,
) {
    loop {
        // Anything accepted before the last close is stale
        loop {
            match outbound_rx.try_recv() {
                Ok(_) => tracing::debug!("Discarding undelivered message for {}", settings.url),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => return,
            }
        }

        if !transition(&state_tx, &event_tx, ConnectionState::Connecting).await {
            return;
        }

        match connect_async(settings.url.as_str()).await {
            Ok((ws_stream, _)) => {
                if !transition(&state_tx, &event_tx, ConnectionState::Open).await {
                    return;
                }
                tracing::info!("Connected to {}", settings.url);

                let (mut write, mut read) = ws_stream.split();

                loop {
                    tokio::select! {
                        msg = read.next() => {
                            match msg {
                                Some(Ok(Message::Text(text))) => {
                                    match serde_json::from_str::<Value>(&text) {
                                        Ok(payload) => {
                                            last_tx.send_replace(Some(payload.clone()));
                                            let event = FeedEvent::Message(payload);
                                            if event_tx.send(event).await.is_err() {
                                                tracing::debug!(
                                                    "Owner of {} went away",
                                                    settings.url
                                                );
                                                let _ = write.send(Message::Close(None)).await;
                                                return;
                                            }
                                        }
                                        Err(e) => {
                                            tracing::warn!(
                                                "Dropping non-JSON message from {}: {}",
                                                settings.url,
                                                e
                                            );
                                        }
                                    }
                                }
                                Some(Ok(Message::Ping(data))) => {
                                    let _ = write.send(Message::Pong(data)).await;
                                }
                                Some(Ok(Message::Close(_))) => {
                                    tracing::info!("{} closed by server", settings.url);
                                    break;
                                }
                                Some(Err(e)) => {
                                    tracing::warn!("WebSocket error on {}: {}", settings.url, e);
                                    break;
                                }
                                None => {
                                    tracing::info!("{} stream ended", settings.url);
                                    break;
                                }
                                _ => {}
                            }
                        }

                        out = outbound_rx.recv() => {
                            match out {
                                Some(value) => {
                                    let frame = Message::Text(value.to_string());
                                    if let Err(e) = write.send(frame).await {
                                        tracing::warn!(
                                            "Failed to write to {}: {}",
                                            settings.url,
                                            e
                                        );
                                        break;
                                    }
                                }
                                None => {
                                    let _ = write.send(Message::Close(None)).await;
                                    state_tx.send_replace(ConnectionState::Closed);
                                    return;
                                }
                            }
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Connection to {} failed: {}", settings.url, e);
            }
        }

        if !transition(&state_tx, &event_tx, ConnectionState::Closed).await {
            return;
        }

        // Always retry, after a fixed pause
        let pause = tokio::time::sleep(settings.reconnect_interval);
        tokio::pin!(pause);
        loop {
            tokio::select! {
                _ = &mut pause => break,
                out = outbound_rx.recv() => {
                    if out.is_none() {
                        return;
                    }
                }
                _ = event_tx.closed() => return,
            }
        }
    }
}
