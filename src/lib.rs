//! Game client networking layer.
//!
//! # Architecture Overview
//!
//! ```text
//!   game code
//!      │
//!      ├──▶ http::RequestExecutor ──▶ Transport (reqwest) ──▶ backend API
//!      │        │   identity headers, timeout policy,
//!      │        │   JSON / texture / file decoding
//!      │        └──▶ events::ErrorSink (ErrorNotice on transport failure)
//!      │
//!      └──▶ ws::SocketSession ──▶ background task (tokio-tungstenite) ──▶ socket server
//!               └──▶ ws::SocketEvents ──▶ SocketHandler (caller's task)
//! ```
//!
//! The two halves share configuration and observability but not state.

// Core subsystems
pub mod http;
pub mod ws;

// Inputs and outputs
pub mod events;
pub mod identity;
pub mod serialization;

// Cross-cutting concerns
pub mod config;
pub mod observability;
pub mod resilience;

pub use config::ClientConfig;
pub use events::{ErrorNotice, ErrorSink};
pub use http::{ApiError, ApiResult, MultipartForm, RequestExecutor, Texture, TextureStore};
pub use identity::{IdentityProvider, SharedIdentity, StaticIdentity, UserIdentity};
pub use resilience::timeouts::RequestTimeout;
pub use ws::{SocketEvent, SocketEvents, SocketHandler, SocketSession};
