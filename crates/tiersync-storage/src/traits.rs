//! The object store trait implemented by storage backends.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;
use crate::types::{StoredObject, WriteOutcome};

/// Versioned key/value store of serialized objects, keyed by kind and name.
///
/// Every write assigns a new resource version. Writes that take `if_match`
/// only succeed when the stored version equals it.
///
/// # Example
///
/// ```ignore
/// use tiersync_storage::{ObjectStore, StorageError, StoredObject};
///
/// async fn get_space(store: &dyn ObjectStore, name: &str) -> Result<StoredObject, StorageError> {
///     store
///         .read("Space", name)
///         .await?
///         .ok_or_else(|| StorageError::not_found("Space", name))
/// }
/// ```
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Creates a new object. `metadata.name` is required.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if an object of the same kind and name exists.
    /// Returns `StorageError::InvalidObject` if the name is missing.
    async fn create(&self, kind: &str, object: &Value) -> Result<StoredObject, StorageError>;

    /// Reads an object by kind and name.
    ///
    /// Returns `None` if the object does not exist.
    async fn read(&self, kind: &str, name: &str) -> Result<Option<StoredObject>, StorageError>;

    /// Lists all objects of a kind, ordered by name.
    async fn list(&self, kind: &str) -> Result<Vec<StoredObject>, StorageError>;

    /// Replaces an object's labels and spec. The stored status is kept.
    ///
    /// The generation moves only when the spec changes.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the object does not exist.
    /// Returns `StorageError::VersionConflict` if `if_match` is provided and doesn't match.
    async fn update(
        &self,
        kind: &str,
        object: &Value,
        if_match: Option<&str>,
    ) -> Result<WriteOutcome, StorageError>;

    /// Replaces only an object's status. The generation never moves.
    ///
    /// # Errors
    ///
    /// Same as [`ObjectStore::update`].
    async fn update_status(
        &self,
        kind: &str,
        name: &str,
        status: &Value,
        if_match: Option<&str>,
    ) -> Result<WriteOutcome, StorageError>;

    /// Deletes an object.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the object does not exist.
    async fn delete(&self, kind: &str, name: &str) -> Result<StoredObject, StorageError>;

    /// Short backend identifier for logs.
    fn backend_name(&self) -> &'static str;
}
