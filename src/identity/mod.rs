//! Identity headers attached to every HTTP request.
//!
//! # Responsibilities
//! - Hold the {version, token, device type, UUID} tuple
//! - Supply the content type used for JSON/string bodies
//! - Fall back to the device identifier when no UUID is configured
//!
//! # Design Decisions
//! - Providers are read-only from the executor's point of view and shared
//!   by all in-flight calls
//! - `SharedIdentity` swaps the whole tuple atomically, so a call never sees
//!   a half-updated identity

pub mod device;

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::config::schema::IdentityConfig;

pub use device::device_identifier;

/// Header carrying the client version.
pub const VERSION_HEADER: &str = "vNo";
/// Header carrying the session token.
pub const TOKEN_HEADER: &str = "token";
/// Header carrying the platform label.
pub const DEVICE_TYPE_HEADER: &str = "Device-Type";
/// Header carrying the device UUID.
pub const UUID_HEADER: &str = "UUID";

/// The identity tuple sent with every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub version: String,
    pub token: String,
    pub device_type: String,
    #[serde(default)]
    pub uuid: Option<String>,
}

impl UserIdentity {
    /// The UUID to send, falling back to `device_id` when unset or empty.
    pub fn effective_uuid<'a>(&'a self, device_id: &'a str) -> &'a str {
        match self.uuid.as_deref() {
            Some(uuid) if !uuid.is_empty() => uuid,
            _ => device_id,
        }
    }

    /// The four identity headers, in wire order.
    pub fn headers(&self, device_id: &str) -> [(&'static str, String); 4] {
        [
            (VERSION_HEADER, self.version.clone()),
            (TOKEN_HEADER, self.token.clone()),
            (DEVICE_TYPE_HEADER, self.device_type.clone()),
            (UUID_HEADER, self.effective_uuid(device_id).to_string()),
        ]
    }
}

/// Source of identity headers and the default content type.
pub trait IdentityProvider: Send + Sync {
    /// Content type for JSON and string bodies.
    fn content_type(&self) -> String;

    /// Current identity tuple.
    fn identity(&self) -> UserIdentity;
}

/// Fixed identity, typically built from configuration.
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    content_type: String,
    identity: UserIdentity,
}

impl StaticIdentity {
    pub fn new(content_type: impl Into<String>, identity: UserIdentity) -> Self {
        Self {
            content_type: content_type.into(),
            identity,
        }
    }
}

impl From<&IdentityConfig> for StaticIdentity {
    fn from(config: &IdentityConfig) -> Self {
        Self::new(config.content_type.clone(), config.to_identity())
    }
}

impl IdentityProvider for StaticIdentity {
    fn content_type(&self) -> String {
        self.content_type.clone()
    }

    fn identity(&self) -> UserIdentity {
        self.identity.clone()
    }
}

/// Identity that can be replaced while requests are in flight (e.g., after login).
#[derive(Debug)]
pub struct SharedIdentity {
    content_type: String,
    identity: ArcSwap<UserIdentity>,
}

impl SharedIdentity {
    pub fn new(content_type: impl Into<String>, identity: UserIdentity) -> Self {
        Self {
            content_type: content_type.into(),
            identity: ArcSwap::from_pointee(identity),
        }
    }

    /// Replace the whole identity tuple.
    pub fn replace(&self, identity: UserIdentity) {
        self.identity.store(Arc::new(identity));
    }

    /// Replace only the session token.
    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        self.identity.rcu(|current| {
            let mut next = UserIdentity::clone(current);
            next.token.clone_from(&token);
            next
        });
        tracing::debug!("Identity token updated");
    }
}

impl IdentityProvider for SharedIdentity {
    fn content_type(&self) -> String {
        self.content_type.clone()
    }

    fn identity(&self) -> UserIdentity {
        UserIdentity::clone(&self.identity.load())
    }
}
