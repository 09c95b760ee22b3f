//! Types returned by object store operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// An object as held by a store, together with its bookkeeping.
///
/// `object` is the full serialized form (`metadata`, `spec`, `status`); its
/// `metadata.resourceVersion` and `metadata.generation` mirror the fields here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObject {
    pub kind: String,
    pub name: String,
    pub resource_version: String,
    pub generation: i64,
    pub object: Value,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

impl StoredObject {
    #[must_use]
    pub fn new(
        kind: impl Into<String>,
        name: impl Into<String>,
        resource_version: impl Into<String>,
        generation: i64,
        object: Value,
    ) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            resource_version: resource_version.into(),
            generation,
            object,
            last_updated: OffsetDateTime::now_utc(),
        }
    }

    /// The object's `spec`, or `Null` when absent.
    pub fn spec(&self) -> &Value {
        self.object.get("spec").unwrap_or(&Value::Null)
    }

    /// The object's `status`, or `Null` when absent.
    pub fn status(&self) -> &Value {
        self.object.get("status").unwrap_or(&Value::Null)
    }
}

/// Result of an update.
///
/// Writes that leave the object unchanged report `changed == false` and carry
/// the stored object as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    pub object: StoredObject,
    /// Generation before the write.
    pub previous_generation: i64,
    pub changed: bool,
}

impl WriteOutcome {
    pub fn changed(object: StoredObject, previous_generation: i64) -> Self {
        Self {
            object,
            previous_generation,
            changed: true,
        }
    }

    pub fn unchanged(object: StoredObject) -> Self {
        let previous_generation = object.generation;
        Self {
            object,
            previous_generation,
            changed: false,
        }
    }
}

/// Extracts `metadata.name` from a serialized object.
pub fn object_name(object: &Value) -> Option<&str> {
    object
        .get("metadata")
        .and_then(|m| m.get("name"))
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
}
