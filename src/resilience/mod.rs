//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Caller timeout (sentinel / explicit seconds)
//!     → timeouts.rs (resolve against policy and ceiling)
//!     → Option<Duration> handed to the transport
//! ```
//!
//! # Design Decisions
//! - Timeouts are the only bound on call duration; there is no cancellation
//! - No retries: every call is exactly one round trip

pub mod timeouts;

pub use timeouts::{resolve_timeout, RequestTimeout, TimeoutPolicy, TimeoutRejected};
