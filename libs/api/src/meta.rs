//! Object metadata shared by every kind.

use chrono::{DateTime, Utc};
use dra_id::{ObjectKey, ResourceVersion};
use serde::{Deserialize, Serialize};

/// Behaviour every mirrored object provides to caches and listers.
pub trait Object: Send + Sync + 'static {
    /// Kind name used in logs and errors (e.g. `ResourceClaim`).
    const KIND: &'static str;

    /// Cache key (`<namespace>/<name>` or `<name>`).
    fn key(&self) -> ObjectKey;

    /// Store-assigned version; larger is newer.
    fn resource_version(&self) -> ResourceVersion;
}

/// Standard object metadata, parametrised by the kind's UID type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta<U> {
    /// Object name, unique within its namespace.
    pub name: String,

    /// Namespace for namespaced kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Stable identity for the object's lifetime.
    pub uid: U,

    /// Version assigned by the store on every write.
    pub resource_version: ResourceVersion,

    /// When the object was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

impl<U> ObjectMeta<U> {
    /// Cache key derived from namespace and name.
    pub fn key(&self) -> ObjectKey {
        match &self.namespace {
            Some(namespace) => ObjectKey::namespaced(namespace.as_str(), self.name.as_str()),
            None => ObjectKey::cluster(self.name.as_str()),
        }
    }
}
