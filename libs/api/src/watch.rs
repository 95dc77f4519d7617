//! Change notifications from the authoritative store.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::meta::Object;

/// One change notification for an object of kind `T`.
///
/// Serialized the way the store's watch stream frames it:
/// `{"type": "MODIFIED", "object": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "object", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatchEvent<T> {
    Added(T),
    Modified(T),
    /// Carries the last known state of the deleted object.
    Deleted(T),
}

impl<T> WatchEvent<T> {
    /// The object carried by the event.
    pub fn object(&self) -> &T {
        match self {
            Self::Added(obj) | Self::Modified(obj) | Self::Deleted(obj) => obj,
        }
    }

    /// Lowercase event name for logs.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Added(_) => "added",
            Self::Modified(_) => "modified",
            Self::Deleted(_) => "deleted",
        }
    }
}

impl<T: Object + DeserializeOwned> WatchEvent<T> {
    /// Decodes one frame of a watch stream.
    ///
    /// A frame whose object declares a different `kind` is rejected instead
    /// of being coerced into `T`.
    pub fn from_json(frame: &str) -> Result<Self, ApiError> {
        let value: serde_json::Value = serde_json::from_str(frame)?;

        if let Some(event_type) = value.get("type").and_then(|t| t.as_str()) {
            if !matches!(event_type, "ADDED" | "MODIFIED" | "DELETED") {
                return Err(ApiError::UnknownEventType(event_type.to_string()));
            }
        }

        if let Some(kind) = value
            .get("object")
            .and_then(|o| o.get("kind"))
            .and_then(|k| k.as_str())
        {
            if kind != T::KIND {
                return Err(ApiError::UnexpectedKind {
                    expected: T::KIND,
                    actual: kind.to_string(),
                });
            }
        }

        Ok(serde_json::from_value(value)?)
    }
}
