//! Single-consumer event dispatch.
//!
//! # Responsibilities
//! - Receive events produced by the connection task
//! - Hand them to a caller-supplied handler on the caller's task
//!
//! # Design Decisions
//! - Handlers run wherever the caller drains the queue, never on the connection task
//! - `drain` never waits, so it fits a per-frame poll loop

use tokio::sync::mpsc;

use crate::ws::types::{SocketEvent, SocketMessage};

/// Callbacks for socket lifecycle events. Every method defaults to a no-op.
pub trait SocketHandler {
    fn on_open(&mut self) {}

    fn on_message(&mut self, _message: SocketMessage) {}

    fn on_close(&mut self, _code: u16, _reason: String) {}

    fn on_error(&mut self, _error: String) {}
}

/// Receiving end of a session's event queue.
#[derive(Debug)]
pub struct SocketEvents {
    rx: mpsc::UnboundedReceiver<SocketEvent>,
}

impl SocketEvents {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<SocketEvent>) -> Self {
        Self { rx }
    }

    /// Wait for the next event. `None` once the session and its task are gone.
    pub async fn recv(&mut self) -> Option<SocketEvent> {
        self.rx.recv().await
    }

    /// Take the next event if one is queued.
    pub fn try_recv(&mut self) -> Option<SocketEvent> {
        self.rx.try_recv().ok()
    }

    /// Dispatch every queued event without waiting. Returns how many were handled.
    pub fn drain<H: SocketHandler + ?Sized>(&mut self, handler: &mut H) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.rx.try_recv() {
            dispatch(handler, event);
            handled += 1;
        }
        handled
    }

    /// Dispatch events until the queue closes.
    pub async fn run<H: SocketHandler>(mut self, mut handler: H) -> H {
        while let Some(event) = self.rx.recv().await {
            dispatch(&mut handler, event);
        }
        handler
    }
}

fn dispatch<H: SocketHandler + ?Sized>(handler: &mut H, event: SocketEvent) {
    match event {
        SocketEvent::Open => handler.on_open(),
        SocketEvent::Message(message) => handler.on_message(message),
        SocketEvent::Close { code, reason } => handler.on_close(code, reason),
        SocketEvent::Error(error) => handler.on_error(error),
    }
}
