//! Event broadcaster for object change notifications.
//!
//! Uses tokio's broadcast channel so several watchers can observe the same
//! stream of writes.

use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::ObjectEvent;

/// Default buffer size for the broadcast channel.
/// Slow receivers beyond this limit observe `RecvError::Lagged`.
const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Thread-safe, cloneable broadcaster of [`ObjectEvent`]s.
///
/// ```
/// use tiersync_core::events::{EventBroadcaster, ObjectEvent};
///
/// let broadcaster = EventBroadcaster::new();
/// let mut receiver = broadcaster.subscribe();
/// broadcaster.send(ObjectEvent::created("Space", "ws-1", 1));
/// assert!(receiver.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<ObjectEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Send an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event (0 if none).
    pub fn send(&self, event: ObjectEvent) -> usize {
        self.sender.send(event).unwrap_or_default()
    }

    pub fn send_created(&self, kind: impl Into<String>, name: impl Into<String>, generation: i64) -> usize {
        self.send(ObjectEvent::created(kind, name, generation))
    }

    pub fn send_updated(
        &self,
        kind: impl Into<String>,
        name: impl Into<String>,
        previous_generation: i64,
        generation: i64,
    ) -> usize {
        self.send(ObjectEvent::updated(kind, name, previous_generation, generation))
    }

    pub fn send_deleted(&self, kind: impl Into<String>, name: impl Into<String>, generation: i64) -> usize {
        self.send(ObjectEvent::deleted(kind, name, generation))
    }

    /// Subscribe to events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ObjectEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBroadcaster")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
