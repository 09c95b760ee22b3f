//! `ObjectStore` implementation for `InMemoryStore`.

use async_trait::async_trait;
use serde_json::Value;
use tiersync_storage::{ObjectStore, StorageError, StoredObject, WriteOutcome, object_name};
use tracing::trace;

use crate::storage::{
    InMemoryStore, check_precondition, field_of, labels_of, make_storage_key, stamp,
};

fn require_name<'a>(kind: &str, object: &'a Value) -> Result<&'a str, StorageError> {
    if !object.is_object() {
        return Err(StorageError::invalid_object(format!(
            "{kind} must be a JSON object"
        )));
    }
    object_name(object)
        .ok_or_else(|| StorageError::invalid_object(format!("{kind} is missing metadata.name")))
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn create(&self, kind: &str, object: &Value) -> Result<StoredObject, StorageError> {
        let name = require_name(kind, object)?;
        let key = make_storage_key(kind, name);

        let _write = self.write_lock.lock().await;
        let guard = self.data.pin();
        if guard.get(&key).is_some() {
            return Err(StorageError::already_exists(kind, name));
        }

        let version = self.next_version();
        let mut body = object.clone();
        stamp(&mut body, &version, 1);
        let stored = StoredObject::new(kind, name, version, 1, body);
        guard.insert(key, stored.clone());

        trace!(kind, name, resource_version = %stored.resource_version, "created object");
        Ok(stored)
    }

    async fn read(&self, kind: &str, name: &str) -> Result<Option<StoredObject>, StorageError> {
        let key = make_storage_key(kind, name);
        let guard = self.data.pin();
        Ok(guard.get(&key).cloned())
    }

    async fn list(&self, kind: &str) -> Result<Vec<StoredObject>, StorageError> {
        let prefix = format!("{kind}/");
        let guard = self.data.pin();
        let mut objects: Vec<StoredObject> = guard
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, stored)| stored.clone())
            .collect();
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }

    async fn update(
        &self,
        kind: &str,
        object: &Value,
        if_match: Option<&str>,
    ) -> Result<WriteOutcome, StorageError> {
        let name = require_name(kind, object)?;
        let key = make_storage_key(kind, name);

        let _write = self.write_lock.lock().await;
        let guard = self.data.pin();
        let existing = guard
            .get(&key)
            .ok_or_else(|| StorageError::not_found(kind, name))?;
        check_precondition(existing, if_match)?;

        let spec_changed = field_of(object, "spec") != field_of(&existing.object, "spec");
        let labels_changed = labels_of(object) != labels_of(&existing.object);
        if !spec_changed && !labels_changed {
            return Ok(WriteOutcome::unchanged(existing.clone()));
        }

        let mut body = object.clone();
        if let Some(map) = body.as_object_mut() {
            match field_of(&existing.object, "status") {
                Some(status) => {
                    map.insert("status".to_string(), status.clone());
                }
                None => {
                    map.remove("status");
                }
            }
        }

        let previous_generation = existing.generation;
        let generation = previous_generation + i64::from(spec_changed);
        let version = self.next_version();
        stamp(&mut body, &version, generation);
        let stored = StoredObject::new(kind, name, version, generation, body);
        guard.insert(key, stored.clone());

        trace!(kind, name, generation, resource_version = %stored.resource_version, "updated object");
        Ok(WriteOutcome::changed(stored, previous_generation))
    }

    async fn update_status(
        &self,
        kind: &str,
        name: &str,
        status: &Value,
        if_match: Option<&str>,
    ) -> Result<WriteOutcome, StorageError> {
        let key = make_storage_key(kind, name);

        let _write = self.write_lock.lock().await;
        let guard = self.data.pin();
        let existing = guard
            .get(&key)
            .ok_or_else(|| StorageError::not_found(kind, name))?;
        check_precondition(existing, if_match)?;

        let status = Some(status).filter(|s| !s.is_null());
        if status == field_of(&existing.object, "status") {
            return Ok(WriteOutcome::unchanged(existing.clone()));
        }

        let mut body = existing.object.clone();
        if let Some(map) = body.as_object_mut() {
            match status {
                Some(status) => {
                    map.insert("status".to_string(), status.clone());
                }
                None => {
                    map.remove("status");
                }
            }
        }

        let generation = existing.generation;
        let version = self.next_version();
        stamp(&mut body, &version, generation);
        let stored = StoredObject::new(kind, name, version, generation, body);
        guard.insert(key, stored.clone());

        trace!(kind, name, resource_version = %stored.resource_version, "updated status");
        Ok(WriteOutcome::changed(stored, generation))
    }

    async fn delete(&self, kind: &str, name: &str) -> Result<StoredObject, StorageError> {
        let key = make_storage_key(kind, name);

        let _write = self.write_lock.lock().await;
        let guard = self.data.pin();
        guard
            .remove(&key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(kind, name))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Helper to get the store as trait object to ensure we use ObjectStore methods
    fn as_object_store(store: &InMemoryStore) -> &dyn ObjectStore {
        store
    }

    fn space(name: &str, tier: &str) -> Value {
        json!({
            "metadata": {"name": name},
            "spec": {"tierName": tier, "targetCluster": "member-1"}
        })
    }

    #[tokio::test]
    async fn test_create_read() {
        let store = InMemoryStore::new();
        let objects = as_object_store(&store);

        let created = objects.create("Space", &space("ws-1", "base")).await.unwrap();
        assert_eq!(created.name, "ws-1");
        assert_eq!(created.generation, 1);
        assert_eq!(
            created.object["metadata"]["resourceVersion"],
            created.resource_version.as_str()
        );

        let read = objects.read("Space", "ws-1").await.unwrap().unwrap();
        assert_eq!(read, created);
        assert!(objects.read("Space", "missing").await.unwrap().is_none());
        assert!(objects.read("MasterUserRecord", "ws-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let store = InMemoryStore::new();
        let err = store
            .create("Space", &json!({"spec": {}}))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidObject { .. }));
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let store = InMemoryStore::new();
        store.create("Space", &space("ws-1", "base")).await.unwrap();
        let err = store.create("Space", &space("ws-1", "base")).await.unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn test_update_bumps_generation_on_spec_change() {
        let store = InMemoryStore::new();
        let created = store.create("Space", &space("ws-1", "base")).await.unwrap();

        let outcome = store
            .update("Space", &space("ws-1", "advanced"), Some(&created.resource_version))
            .await
            .unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.previous_generation, 1);
        assert_eq!(outcome.object.generation, 2);
        assert_ne!(outcome.object.resource_version, created.resource_version);
    }

    #[tokio::test]
    async fn test_label_only_update_keeps_generation() {
        let store = InMemoryStore::new();
        let created = store.create("Space", &space("ws-1", "base")).await.unwrap();

        let mut labelled = space("ws-1", "base");
        labelled["metadata"]["labels"] = json!({"tiersync.dev/base-tier-hash": "h1"});
        let outcome = store
            .update("Space", &labelled, Some(&created.resource_version))
            .await
            .unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.object.generation, 1);
        assert_eq!(
            outcome.object.object["metadata"]["labels"]["tiersync.dev/base-tier-hash"],
            "h1"
        );
    }

    #[tokio::test]
    async fn test_update_unchanged_is_noop() {
        let store = InMemoryStore::new();
        let created = store.create("Space", &space("ws-1", "base")).await.unwrap();

        let outcome = store
            .update("Space", &space("ws-1", "base"), None)
            .await
            .unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.object.resource_version, created.resource_version);
    }

    #[tokio::test]
    async fn test_update_keeps_status() {
        let store = InMemoryStore::new();
        let mut initial = space("ws-1", "base");
        initial["status"] = json!({"conditions": [{"type": "Ready", "status": "True"}]});
        store.create("Space", &initial).await.unwrap();

        let mut replacement = space("ws-1", "advanced");
        replacement["status"] = json!({"conditions": []});
        let outcome = store.update("Space", &replacement, None).await.unwrap();
        assert_eq!(
            outcome.object.object["status"]["conditions"][0]["type"],
            "Ready"
        );
    }

    #[tokio::test]
    async fn test_update_version_conflict() {
        let store = InMemoryStore::new();
        let created = store.create("Space", &space("ws-1", "base")).await.unwrap();
        store
            .update("Space", &space("ws-1", "advanced"), None)
            .await
            .unwrap();

        let err = store
            .update("Space", &space("ws-1", "other"), Some(&created.resource_version))
            .await
            .unwrap_err();
        assert!(err.is_version_conflict());
    }

    #[tokio::test]
    async fn test_update_missing() {
        let store = InMemoryStore::new();
        let err = store
            .update("Space", &space("ws-1", "base"), None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_status() {
        let store = InMemoryStore::new();
        let created = store.create("Space", &space("ws-1", "base")).await.unwrap();
        let status = json!({"conditions": [{"type": "Ready", "status": "True"}]});

        let outcome = store
            .update_status("Space", "ws-1", &status, Some(&created.resource_version))
            .await
            .unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.object.generation, 1);
        assert_eq!(outcome.object.status(), &status);
        assert_eq!(outcome.object.spec()["tierName"], "base");

        let again = store
            .update_status("Space", "ws-1", &status, None)
            .await
            .unwrap();
        assert!(!again.changed);
        assert_eq!(
            again.object.resource_version,
            outcome.object.resource_version
        );

        let err = store
            .update_status("Space", "ws-1", &json!({}), Some(&created.resource_version))
            .await
            .unwrap_err();
        assert!(err.is_version_conflict());
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let store = InMemoryStore::new();
        store.create("Space", &space("ws-b", "base")).await.unwrap();
        store.create("Space", &space("ws-a", "base")).await.unwrap();
        store
            .create("MasterUserRecord", &json!({"metadata": {"name": "alice"}, "spec": {}}))
            .await
            .unwrap();

        let spaces = store.list("Space").await.unwrap();
        let names: Vec<&str> = spaces.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["ws-a", "ws-b"]);
        assert_eq!(store.len(), 3);

        let removed = store.delete("Space", "ws-a").await.unwrap();
        assert_eq!(removed.name, "ws-a");
        assert!(store.read("Space", "ws-a").await.unwrap().is_none());
        assert!(store.delete("Space", "ws-a").await.unwrap_err().is_not_found());
    }
}
