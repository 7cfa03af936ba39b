//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0)
//! - Check URLs and header values before the first request goes out
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::ClientConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("http.timeout_ceiling_secs must be greater than 0")]
    ZeroTimeoutCeiling,

    #[error("http.connect_timeout_secs must be greater than 0")]
    ZeroConnectTimeout,

    #[error("identity.{field} contains characters not allowed in a header value")]
    InvalidHeaderValue { field: &'static str },

    #[error("identity.content_type cannot be empty")]
    EmptyContentType,

    #[error("socket.url '{url}' is not a ws:// or wss:// URL")]
    InvalidSocketUrl { url: String },

    #[error("storage.root cannot be empty")]
    EmptyStorageRoot,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.http.timeout_ceiling_secs == 0 {
        errors.push(ValidationError::ZeroTimeoutCeiling);
    }
    if config.http.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }

    let identity = &config.identity;
    if identity.content_type.trim().is_empty() {
        errors.push(ValidationError::EmptyContentType);
    }
    let header_fields = [
        ("version", identity.version.as_str()),
        ("token", identity.token.as_str()),
        ("device_type", identity.device_type.as_str()),
        ("uuid", identity.uuid.as_deref().unwrap_or_default()),
        ("content_type", identity.content_type.as_str()),
    ];
    for (field, value) in header_fields {
        if !is_header_safe(value) {
            errors.push(ValidationError::InvalidHeaderValue { field });
        }
    }

    if let Some(url) = &config.socket.url {
        let valid = url::Url::parse(url)
            .map(|u| matches!(u.scheme(), "ws" | "wss"))
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::InvalidSocketUrl { url: url.clone() });
        }
    }

    if config.storage.root.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyStorageRoot);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Visible ASCII plus space and tab, the set accepted by `HeaderValue::from_str`.
fn is_header_safe(value: &str) -> bool {
    value.bytes().all(|b| b == b'\t' || (b' '..=b'~').contains(&b))
}
