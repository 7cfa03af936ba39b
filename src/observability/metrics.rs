//! Metrics collection.
//!
//! # Responsibilities
//! - Count HTTP round trips by verb and outcome
//! - Record request latency
//! - Count WebSocket lifecycle events
//!
//! # Metrics
//! - `gamelink_http_requests_total` (counter): requests by verb, outcome
//! - `gamelink_http_request_duration_seconds` (histogram): latency by verb
//! - `gamelink_socket_events_total` (counter): socket events by kind
//!
//! # Design Decisions
//! - Uses the `metrics` facade; the embedding application installs a recorder
//! - Without a recorder every call is a no-op

use std::time::Instant;

/// Record one finished HTTP call.
pub fn record_request(verb: &'static str, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "gamelink_http_requests_total",
        "verb" => verb,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("gamelink_http_request_duration_seconds", "verb" => verb)
        .record(start.elapsed().as_secs_f64());
}

/// Record one socket lifecycle event.
pub fn record_socket_event(event: &'static str) {
    metrics::counter!("gamelink_socket_events_total", "event" => event).increment(1);
}
