//! Body serialization.
//!
//! The executor delegates request encoding and response decoding to a
//! [`Serializer`]; `JsonSerializer` is the default.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Encoding or decoding failure reported by a serializer.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SerializationError(pub String);

/// Converts between typed values and body text.
pub trait Serializer: Send + Sync {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, SerializationError>;

    fn deserialize<T: DeserializeOwned>(&self, text: &str) -> Result<T, SerializationError>;
}

/// `serde_json` backed serializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, SerializationError> {
        serde_json::to_string(value).map_err(|e| SerializationError(e.to_string()))
    }

    fn deserialize<T: DeserializeOwned>(&self, text: &str) -> Result<T, SerializationError> {
        serde_json::from_str(text).map_err(|e| {
            if e.is_syntax() {
                SerializationError(format!("JSON syntax error: {e}"))
            } else {
                SerializationError(e.to_string())
            }
        })
    }
}
