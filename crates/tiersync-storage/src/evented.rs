//! EventedStore - an object store wrapper that publishes change events.
//!
//! # Example
//!
//! ```ignore
//! use tiersync_storage::EventedStore;
//! use tiersync_core::events::EventBroadcaster;
//!
//! let broadcaster = EventBroadcaster::new_shared();
//! let store = EventedStore::new(InMemoryStore::new(), broadcaster.clone());
//! let mut events = broadcaster.subscribe();
//!
//! store.create("Space", &space_json).await?;
//! // `events` now yields an ObjectEvent for Space/<name>
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tiersync_core::events::{EventBroadcaster, ObjectEvent};
use tracing::debug;

use crate::error::StorageError;
use crate::traits::ObjectStore;
use crate::types::{StoredObject, WriteOutcome};

/// Delegates to an inner store and emits an [`ObjectEvent`] after every
/// successful write that changed something.
///
/// Events are emitted only after the inner write succeeded, so every event
/// corresponds to a persisted change.
pub struct EventedStore<S: ObjectStore> {
    inner: S,
    broadcaster: Arc<EventBroadcaster>,
}

impl<S: ObjectStore> EventedStore<S> {
    pub fn new(inner: S, broadcaster: Arc<EventBroadcaster>) -> Self {
        Self { inner, broadcaster }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn broadcaster(&self) -> &Arc<EventBroadcaster> {
        &self.broadcaster
    }

    fn emit(&self, event: ObjectEvent) {
        if !self.broadcaster.has_subscribers() {
            return;
        }
        let kind = event.kind.clone();
        let name = event.name.clone();
        let event_type = event.event_type;
        let count = self.broadcaster.send(event);
        debug!(
            kind = %kind,
            name = %name,
            event_type = %event_type,
            subscribers = count,
            "Emitted object event"
        );
    }

    fn emit_outcome(&self, outcome: &WriteOutcome) {
        if !outcome.changed {
            return;
        }
        let stored = &outcome.object;
        self.emit(
            ObjectEvent::updated(
                &stored.kind,
                &stored.name,
                outcome.previous_generation,
                stored.generation,
            )
            .with_resource_version(&stored.resource_version),
        );
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for EventedStore<S> {
    async fn create(&self, kind: &str, object: &Value) -> Result<StoredObject, StorageError> {
        let stored = self.inner.create(kind, object).await?;
        self.emit(
            ObjectEvent::created(&stored.kind, &stored.name, stored.generation)
                .with_resource_version(&stored.resource_version),
        );
        Ok(stored)
    }

    async fn read(&self, kind: &str, name: &str) -> Result<Option<StoredObject>, StorageError> {
        self.inner.read(kind, name).await
    }

    async fn list(&self, kind: &str) -> Result<Vec<StoredObject>, StorageError> {
        self.inner.list(kind).await
    }

    async fn update(
        &self,
        kind: &str,
        object: &Value,
        if_match: Option<&str>,
    ) -> Result<WriteOutcome, StorageError> {
        let outcome = self.inner.update(kind, object, if_match).await?;
        self.emit_outcome(&outcome);
        Ok(outcome)
    }

    async fn update_status(
        &self,
        kind: &str,
        name: &str,
        status: &Value,
        if_match: Option<&str>,
    ) -> Result<WriteOutcome, StorageError> {
        let outcome = self.inner.update_status(kind, name, status, if_match).await?;
        self.emit_outcome(&outcome);
        Ok(outcome)
    }

    async fn delete(&self, kind: &str, name: &str) -> Result<StoredObject, StorageError> {
        let stored = self.inner.delete(kind, name).await?;
        self.emit(ObjectEvent::deleted(&stored.kind, &stored.name, stored.generation));
        Ok(stored)
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}
