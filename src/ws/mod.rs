//! WebSocket subsystem.
//!
//! # Data Flow
//! ```text
//! SocketSession::connect
//!     → session.rs (background task owns the socket)
//!     → SocketEvent over an unbounded queue
//!     → dispatch.rs (SocketEvents drained onto a SocketHandler)
//! ```

pub mod dispatch;
pub mod session;
pub mod types;

pub use dispatch::{SocketEvents, SocketHandler};
pub use session::SocketSession;
pub use types::{ReadyState, SocketError, SocketEvent, SocketMessage};
