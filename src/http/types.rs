//! Request outcome types and error definitions.

use std::path::PathBuf;

use thiserror::Error;

use crate::http::texture::ImageCodec;

/// Errors surfaced by [`RequestExecutor`](crate::http::RequestExecutor) calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx status, connection failure or network timeout.
    #[error("transport failure (status {status}): {message}")]
    Transport {
        /// HTTP status, 0 when no response was received.
        status: u16,
        /// Raw response body.
        body: String,
        message: String,
    },

    /// Caller passed a non-positive explicit timeout; nothing was sent.
    #[error("timeout of {0}s rejected: explicit timeouts must be positive")]
    TimeoutRejected(i32),

    /// Response body could not be decoded into the requested type.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(String),

    /// URL rejected before sending.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Image bytes could not be decoded into a texture.
    #[error("{codec} decode failed: {reason}")]
    Image { codec: ImageCodec, reason: String },

    /// Writing a download to disk failed.
    #[error("failed to write {path}: {reason}")]
    Io { path: PathBuf, reason: String },
}

impl ApiError {
    /// HTTP status of a transport failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure came from the network layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::TimeoutRejected(_) => "timeout_rejected",
            Self::Decode(_) => "decode",
            Self::Encode(_) => "encode",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Image { .. } => "image",
            Self::Io { .. } => "io",
        }
    }
}

/// Result type for executor calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failures reported by a [`Transport`](crate::http::Transport) before any HTTP status exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}
