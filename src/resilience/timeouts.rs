//! Timeout resolution.
//!
//! # Responsibilities
//! - Translate caller-supplied timeouts into an effective deadline
//! - Clamp explicit values to the configured ceiling
//! - Reject non-positive explicit values before any network activity
//!
//! # Design Decisions
//! - Uses the HTTP client's per-request timeout; no extra timer task
//! - A rejected timeout is a caller error, distinct from a network timeout
//! - GET keeps the legacy verbatim rule: any value above -1 is used as given

use std::time::Duration;

/// Raw value meaning "use the default ceiling".
pub const TIMEOUT_SENTINEL: i32 = -100;

/// Default ceiling in seconds.
pub const DEFAULT_TIMEOUT_CEILING_SECS: u64 = 30;

/// Timeout requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestTimeout {
    /// Use the executor's ceiling.
    #[default]
    Default,
    /// Explicit number of seconds.
    Secs(i32),
}

impl From<i32> for RequestTimeout {
    fn from(raw: i32) -> Self {
        if raw == TIMEOUT_SENTINEL {
            Self::Default
        } else {
            Self::Secs(raw)
        }
    }
}

/// How a verb interprets explicit timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// Explicit values must be positive and are capped at the ceiling.
    Clamped,
    /// Values above -1 are used as given (0 = unbounded); -1 or less disables the timeout.
    Verbatim,
}

/// An explicit timeout that the clamped policy refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutRejected(pub i32);

/// Resolve the effective timeout. `Ok(None)` means no timeout is enforced.
pub fn resolve_timeout(
    requested: RequestTimeout,
    policy: TimeoutPolicy,
    ceiling: Duration,
) -> Result<Option<Duration>, TimeoutRejected> {
    let secs = match requested {
        RequestTimeout::Default => return Ok(Some(ceiling)),
        RequestTimeout::Secs(secs) => secs,
    };

    match policy {
        TimeoutPolicy::Clamped => {
            if secs <= 0 {
                return Err(TimeoutRejected(secs));
            }
            Ok(Some(Duration::from_secs(secs.unsigned_abs().into()).min(ceiling)))
        }
        TimeoutPolicy::Verbatim => {
            if secs > 0 {
                Ok(Some(Duration::from_secs(secs.unsigned_abs().into())))
            } else {
                Ok(None)
            }
        }
    }
}
