//! Socket state, events and errors.

use std::fmt;

use thiserror::Error;

/// Connection state of a session.
///
/// Stored as a `u8` so the connection task and the session share it lock-free.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Disconnected = 0,
    Connecting = 1,
    Open = 2,
    Closing = 3,
    Closed = 4,
}

impl From<u8> for ReadyState {
    fn from(v: u8) -> Self {
        match v {
            1 => ReadyState::Connecting,
            2 => ReadyState::Open,
            3 => ReadyState::Closing,
            4 => ReadyState::Closed,
            _ => ReadyState::Disconnected,
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReadyState::Disconnected => "disconnected",
            ReadyState::Connecting => "connecting",
            ReadyState::Open => "open",
            ReadyState::Closing => "closing",
            ReadyState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Payload of an inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketMessage {
    Text(String),
    Binary(Vec<u8>),
    /// A ping from the peer. It has already been answered.
    Ping(Vec<u8>),
}

/// Lifecycle events produced by the connection task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Open,
    Message(SocketMessage),
    Close { code: u16, reason: String },
    Error(String),
}

impl SocketEvent {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            SocketEvent::Open => "open",
            SocketEvent::Message(_) => "message",
            SocketEvent::Close { .. } => "close",
            SocketEvent::Error(_) => "error",
        }
    }
}

/// Close code used when the connection ended without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SocketError {
    #[error("socket is not open (state: {0})")]
    NotConnected(ReadyState),

    #[error("invalid socket url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}
