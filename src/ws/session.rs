//! WebSocket session.
//!
//! # Responsibilities
//! - Own one connection to one URL
//! - Run the connection on a background task
//! - Forward open, message, close and error events to the event queue
//! - Accept text frames and pings from any task while open
//!
//! # State Transitions
//! ```text
//! Disconnected/Closed → Connecting: connect()
//! Connecting → Open: handshake completed
//! Connecting → Closed: handshake failed (Error event)
//! Open → Closing: disconnect() or session dropped
//! Open/Closing → Closed: stream ended (Close event)
//! ```
//!
//! # Design Decisions
//! - The connection task owns the socket; the session only holds a command channel
//! - State is an atomic read live by the session, so `is_alive` may race with a close
//! - Peer pings are answered by tungstenite and also surfaced as message events
//! - Nothing is queued while the socket is not open

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use crate::observability::metrics;
use crate::ws::dispatch::SocketEvents;
use crate::ws::types::{ReadyState, SocketError, SocketEvent, SocketMessage, ABNORMAL_CLOSURE};

#[derive(Debug)]
enum Outbound {
    Text(String),
    Ping(Vec<u8>),
    Close,
}

/// One WebSocket connection and its event queue.
#[derive(Debug)]
pub struct SocketSession {
    url: String,
    state: Arc<AtomicU8>,
    events: mpsc::UnboundedSender<SocketEvent>,
    outbound: ArcSwapOption<mpsc::UnboundedSender<Outbound>>,
}

impl SocketSession {
    /// Create a session for a `ws://` or `wss://` URL. Does not connect.
    pub fn new(url: impl Into<String>) -> Result<(Self, SocketEvents), SocketError> {
        let url = url.into();
        let parsed = url::Url::parse(&url).map_err(|e| SocketError::InvalidUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(SocketError::InvalidUrl {
                reason: format!("unsupported scheme {}", parsed.scheme()),
                url,
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self {
            url,
            state: Arc::new(AtomicU8::new(ReadyState::Disconnected as u8)),
            events: tx,
            outbound: ArcSwapOption::empty(),
        };
        Ok((session, SocketEvents::new(rx)))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn ready_state(&self) -> ReadyState {
        ReadyState::from(self.state.load(Ordering::SeqCst))
    }

    pub fn is_alive(&self) -> bool {
        self.ready_state() == ReadyState::Open
    }

    /// Start connecting in the background. The outcome arrives as an `Open` or `Error` event.
    pub fn connect(&self) {
        let current = self.ready_state();
        if matches!(
            current,
            ReadyState::Connecting | ReadyState::Open | ReadyState::Closing
        ) {
            tracing::warn!(url = %self.url, state = %current, "Connect ignored, socket is busy");
            return;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(url = %self.url, error = %e, "Cannot connect outside a tokio runtime");
                emit(&self.events, SocketEvent::Error(e.to_string()));
                return;
            }
        };

        if self
            .state
            .compare_exchange(
                current as u8,
                ReadyState::Connecting as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            tracing::warn!(url = %self.url, "Connect ignored, state changed concurrently");
            return;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.outbound.store(Some(Arc::new(tx)));

        tracing::info!(url = %self.url, "Connecting socket");
        handle.spawn(run_connection(
            self.url.clone(),
            Arc::clone(&self.state),
            self.events.clone(),
            rx,
        ));
    }

    /// Close with a normal closure frame. Does nothing unless open.
    pub fn disconnect(&self) {
        // The connection task may store Closed at any moment; never overwrite it
        if let Err(current) = self.state.compare_exchange(
            ReadyState::Open as u8,
            ReadyState::Closing as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            tracing::debug!(url = %self.url, state = %ReadyState::from(current), "Disconnect ignored");
            return;
        }
        if let Some(outbound) = self.outbound.load_full() {
            let _ = outbound.send(Outbound::Close);
        }
    }

    /// Send a text frame.
    pub fn send(&self, data: &str) -> Result<(), SocketError> {
        self.command(Outbound::Text(data.to_string()))
    }

    /// Send a protocol ping with an optional payload.
    pub fn ping(&self, message: Option<&str>) -> Result<(), SocketError> {
        let payload = message.map(|m| m.as_bytes().to_vec()).unwrap_or_default();
        self.command(Outbound::Ping(payload))?;
        tracing::debug!(url = %self.url, "Ping sent");
        Ok(())
    }

    fn command(&self, command: Outbound) -> Result<(), SocketError> {
        let state = self.ready_state();
        if state != ReadyState::Open {
            return Err(SocketError::NotConnected(state));
        }
        let outbound = self
            .outbound
            .load_full()
            .ok_or(SocketError::NotConnected(state))?;
        outbound
            .send(command)
            .map_err(|_| SocketError::NotConnected(self.ready_state()))
    }
}

impl Drop for SocketSession {
    fn drop(&mut self) {
        if let Some(outbound) = self.outbound.swap(None) {
            let _ = outbound.send(Outbound::Close);
        }
    }
}

fn emit(events: &mpsc::UnboundedSender<SocketEvent>, event: SocketEvent) {
    metrics::record_socket_event(event.label());
    // Receiver gone means nobody is listening any more
    let _ = events.send(event);
}

async fn run_connection(
    url: String,
    state: Arc<AtomicU8>,
    events: mpsc::UnboundedSender<SocketEvent>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    let socket = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((socket, _response)) => socket,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Socket connection failed");
            state.store(ReadyState::Closed as u8, Ordering::SeqCst);
            emit(&events, SocketEvent::Error(e.to_string()));
            return;
        }
    };

    state.store(ReadyState::Open as u8, Ordering::SeqCst);
    tracing::info!(url = %url, "Socket open");
    emit(&events, SocketEvent::Open);

    let (mut sink, mut stream) = socket.split();
    let mut close_frame: Option<(u16, String)> = None;
    let mut closing = false;

    loop {
        tokio::select! {
            command = outbound.recv(), if !closing => {
                let message = match command {
                    Some(Outbound::Text(text)) => Message::Text(text.into()),
                    Some(Outbound::Ping(payload)) => Message::Ping(payload.into()),
                    Some(Outbound::Close) | None => {
                        closing = true;
                        state.store(ReadyState::Closing as u8, Ordering::SeqCst);
                        Message::Close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: "".into(),
                        }))
                    }
                };
                if let Err(e) = sink.send(message).await {
                    tracing::warn!(url = %url, error = %e, "Socket write failed");
                    emit(&events, SocketEvent::Error(e.to_string()));
                    break;
                }
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    emit(&events, SocketEvent::Message(SocketMessage::Text(text.as_str().to_string())));
                }
                Some(Ok(Message::Binary(data))) => {
                    emit(&events, SocketEvent::Message(SocketMessage::Binary(data.to_vec())));
                }
                Some(Ok(Message::Ping(payload))) => {
                    emit(&events, SocketEvent::Message(SocketMessage::Ping(payload.to_vec())));
                }
                Some(Ok(Message::Pong(_))) => {
                    tracing::debug!(url = %url, "Pong received");
                }
                Some(Ok(Message::Close(frame))) => {
                    close_frame = Some(match frame {
                        Some(f) => (u16::from(f.code), f.reason.as_str().to_string()),
                        None => (u16::from(CloseCode::Status), String::new()),
                    });
                    state.store(ReadyState::Closing as u8, Ordering::SeqCst);
                }
                Some(Ok(Message::Frame(_))) => {}
                Some(Err(e)) => {
                    tracing::warn!(url = %url, error = %e, "Socket read failed");
                    emit(&events, SocketEvent::Error(e.to_string()));
                    break;
                }
                None => break,
            }
        }
    }

    state.store(ReadyState::Closed as u8, Ordering::SeqCst);
    let (code, reason) = close_frame.unwrap_or((ABNORMAL_CLOSURE, String::new()));
    tracing::info!(url = %url, code, reason = %reason, "Socket closed");
    emit(&events, SocketEvent::Close { code, reason });
}
