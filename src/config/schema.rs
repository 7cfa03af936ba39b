//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::identity::UserIdentity;
use crate::resilience::timeouts::DEFAULT_TIMEOUT_CEILING_SECS;

/// Root configuration for the networking layer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Identity attached to every HTTP request.
    pub identity: IdentityConfig,

    /// HTTP client settings.
    pub http: HttpConfig,

    /// Persistent storage used by texture and file downloads.
    pub storage: StorageConfig,

    /// WebSocket settings.
    pub socket: SocketConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Identity headers and content type.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Client build / protocol version sent as `vNo`.
    pub version: String,

    /// Session token sent as `token`.
    pub token: String,

    /// Platform label sent as `Device-Type`.
    pub device_type: String,

    /// Explicit device UUID. Empty or missing falls back to the device identifier.
    pub uuid: Option<String>,

    /// Content type for JSON and string bodies.
    pub content_type: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            token: String::new(),
            device_type: std::env::consts::OS.to_string(),
            uuid: None,
            content_type: "application/json".to_string(),
        }
    }
}

impl IdentityConfig {
    /// Split into the identity tuple carried on the wire.
    pub fn to_identity(&self) -> UserIdentity {
        UserIdentity {
            version: self.version.clone(),
            token: self.token.clone(),
            device_type: self.device_type.clone(),
            uuid: self.uuid.clone(),
        }
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Upper bound applied to every caller-supplied timeout, in seconds.
    pub timeout_ceiling_secs: u64,

    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ceiling_secs: DEFAULT_TIMEOUT_CEILING_SECS,
            connect_timeout_secs: 10,
            user_agent: format!("gamelink/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Storage layout for downloaded assets.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory; assets land under `<root>/<key>/<filename>`.
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
        }
    }
}

/// WebSocket configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SocketConfig {
    /// Default socket endpoint (e.g., "wss://example.com/ws/").
    pub url: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.http.timeout_ceiling_secs, 30);
        assert_eq!(config.identity.content_type, "application/json");
        assert!(config.identity.uuid.is_none());
        assert!(config.socket.url.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [identity]
            token = "abc"
            device_type = "Android"

            [socket]
            url = "wss://game.example/ws/"
            "#,
        )
        .unwrap();

        assert_eq!(config.identity.token, "abc");
        assert_eq!(config.identity.device_type, "Android");
        assert_eq!(config.identity.content_type, "application/json");
        assert_eq!(config.http.timeout_ceiling_secs, 30);
        assert_eq!(config.socket.url.as_deref(), Some("wss://game.example/ws/"));
    }

    #[test]
    fn test_to_identity() {
        let mut cfg = IdentityConfig::default();
        cfg.token = "t".into();
        cfg.uuid = Some("u-1".into());
        let identity = cfg.to_identity();
        assert_eq!(identity.token, "t");
        assert_eq!(identity.uuid.as_deref(), Some("u-1"));
    }
}
