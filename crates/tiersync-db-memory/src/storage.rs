use papaya::HashMap as PapayaHashMap;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tiersync_storage::{StorageError, StoredObject};
use tokio::sync::Mutex;

pub type StorageKey = String; // Format: "Kind/name"

pub(crate) fn make_storage_key(kind: &str, name: &str) -> StorageKey {
    format!("{kind}/{name}")
}

/// In-memory object store backed by a papaya lock-free HashMap.
///
/// Reads never block. Writes are serialized by a single mutex so the
/// version check and the insert happen atomically.
#[derive(Debug)]
pub struct InMemoryStore {
    pub(crate) data: Arc<PapayaHashMap<StorageKey, StoredObject>>,
    /// Atomic counter for generating resource versions
    pub(crate) version_counter: AtomicU64,
    pub(crate) write_lock: Mutex<()>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            data: Arc::new(PapayaHashMap::new()),
            version_counter: AtomicU64::new(1),
            write_lock: Mutex::new(()),
        }
    }

    pub(crate) fn next_version(&self) -> String {
        self.version_counter
            .fetch_add(1, Ordering::SeqCst)
            .to_string()
    }

    /// Number of stored objects across all kinds.
    pub fn len(&self) -> usize {
        self.data.pin().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn check_precondition(
    existing: &StoredObject,
    if_match: Option<&str>,
) -> Result<(), StorageError> {
    match if_match {
        Some(expected) if expected != existing.resource_version => Err(
            StorageError::version_conflict(expected, existing.resource_version.clone()),
        ),
        _ => Ok(()),
    }
}

/// Writes the bookkeeping fields into `metadata`.
pub(crate) fn stamp(object: &mut Value, resource_version: &str, generation: i64) {
    if let Some(meta) = object.get_mut("metadata").and_then(Value::as_object_mut) {
        meta.insert(
            "resourceVersion".to_string(),
            Value::String(resource_version.to_string()),
        );
        meta.insert("generation".to_string(), Value::from(generation));
    }
}

/// Non-empty labels of a serialized object.
pub(crate) fn labels_of(object: &Value) -> Option<&Value> {
    object
        .get("metadata")
        .and_then(|m| m.get("labels"))
        .filter(|labels| labels.as_object().is_some_and(|l| !l.is_empty()))
}

/// A field of a serialized object, treating `null` as absent.
pub(crate) fn field_of<'a>(object: &'a Value, field: &str) -> Option<&'a Value> {
    object.get(field).filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_storage_key() {
        assert_eq!(make_storage_key("Space", "ws-1"), "Space/ws-1");
    }

    #[test]
    fn test_next_version_increments() {
        let store = InMemoryStore::new();
        let a: u64 = store.next_version().parse().unwrap();
        let b: u64 = store.next_version().parse().unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_labels_of_ignores_empty() {
        assert!(labels_of(&json!({"metadata": {"name": "a"}})).is_none());
        assert!(labels_of(&json!({"metadata": {"name": "a", "labels": {}}})).is_none());
        assert!(labels_of(&json!({"metadata": {"labels": {"k": "v"}}})).is_some());
    }

    #[test]
    fn test_stamp() {
        let mut object = json!({"metadata": {"name": "a"}});
        stamp(&mut object, "7", 2);
        assert_eq!(object["metadata"]["resourceVersion"], "7");
        assert_eq!(object["metadata"]["generation"], 2);
    }
}
