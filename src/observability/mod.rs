//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! RequestExecutor / SocketSession produce:
//!     → logging.rs (structured log events, `api_call` target)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (plain or JSON lines)
//!     → whatever metrics recorder the host application installs
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, API_CALL_TARGET};
