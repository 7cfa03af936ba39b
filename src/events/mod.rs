//! Error notifications for transport failures.
//!
//! # Responsibilities
//! - Carry {status, body} of every failed round trip to interested listeners
//! - Decouple the executor from whoever displays or logs the failure
//!
//! # Design Decisions
//! - The sink is passed to the executor at construction; there is no global hub
//! - Delivery never blocks and never fails the originating call

use tokio::sync::{broadcast, mpsc};

/// A transport failure as seen by listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    /// HTTP status, or 0 when no response was received.
    pub status: u16,
    /// Raw response body (empty when no response was received).
    pub body: String,
}

/// Receives a notice for every transport failure.
pub trait ErrorSink: Send + Sync {
    fn error_received(&self, notice: ErrorNotice);
}

/// Discards every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ErrorSink for NullSink {
    fn error_received(&self, _notice: ErrorNotice) {}
}

impl ErrorSink for mpsc::UnboundedSender<ErrorNotice> {
    fn error_received(&self, notice: ErrorNotice) {
        if self.send(notice).is_err() {
            tracing::trace!("Error notice dropped; receiver gone");
        }
    }
}

impl ErrorSink for broadcast::Sender<ErrorNotice> {
    fn error_received(&self, notice: ErrorNotice) {
        // No subscribers is not an error
        let _ = self.send(notice);
    }
}

/// Adapts a closure into an [`ErrorSink`].
pub struct FnSink<F>(pub F);

impl<F> ErrorSink for FnSink<F>
where
    F: Fn(ErrorNotice) + Send + Sync,
{
    fn error_received(&self, notice: ErrorNotice) {
        (self.0)(notice);
    }
}

impl<F> std::fmt::Debug for FnSink<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnSink")
    }
}
