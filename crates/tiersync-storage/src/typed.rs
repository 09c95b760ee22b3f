//! Typed access to an object store.

use std::marker::PhantomData;

use serde_json::Value;
use tiersync_core::Resource;

use crate::error::StorageError;
use crate::types::StoredObject;
use crate::{DynStore, StorageResult};

/// Typed handle for one resource kind on a shared store.
///
/// Updates use the object's own `metadata.resourceVersion` as the `if_match`
/// precondition, so a write based on a stale read fails with
/// `StorageError::VersionConflict`.
pub struct Api<K> {
    store: DynStore,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Clone for Api<K> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: Resource> Api<K> {
    pub fn new(store: DynStore) -> Self {
        Self {
            store,
            _kind: PhantomData,
        }
    }

    pub fn store(&self) -> &DynStore {
        &self.store
    }

    pub async fn get(&self, name: &str) -> StorageResult<Option<K>> {
        self.store
            .read(K::KIND, name)
            .await?
            .map(decode::<K>)
            .transpose()
    }

    pub async fn list(&self) -> StorageResult<Vec<K>> {
        self.store
            .list(K::KIND)
            .await?
            .into_iter()
            .map(decode::<K>)
            .collect()
    }

    pub async fn create(&self, object: &K) -> StorageResult<K> {
        let value = serde_json::to_value(object)?;
        decode(self.store.create(K::KIND, &value).await?)
    }

    /// Writes labels and spec.
    pub async fn update(&self, object: &K) -> StorageResult<K> {
        let value = serde_json::to_value(object)?;
        let outcome = self
            .store
            .update(K::KIND, &value, object.meta().resource_version.as_deref())
            .await?;
        decode(outcome.object)
    }

    /// Writes only the status.
    pub async fn update_status(&self, object: &K) -> StorageResult<K> {
        let mut value = serde_json::to_value(object)?;
        let status = value
            .get_mut("status")
            .map(Value::take)
            .unwrap_or(Value::Null);
        let outcome = self
            .store
            .update_status(
                K::KIND,
                object.name(),
                &status,
                object.meta().resource_version.as_deref(),
            )
            .await?;
        decode(outcome.object)
    }

    pub async fn delete(&self, name: &str) -> StorageResult<()> {
        self.store.delete(K::KIND, name).await.map(|_| ())
    }
}

fn decode<K: Resource>(stored: StoredObject) -> StorageResult<K> {
    let mut object: K = serde_json::from_value(stored.object).map_err(|e| {
        StorageError::serialization(format!("{}/{}: {e}", stored.kind, stored.name))
    })?;
    let meta = object.meta_mut();
    meta.resource_version = Some(stored.resource_version);
    meta.generation = stored.generation;
    Ok(object)
}
