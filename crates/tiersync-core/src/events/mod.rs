//! Object change notifications.
//!
//! Storage backends publish an [`ObjectEvent`] after every successful write;
//! watchers subscribe through the [`EventBroadcaster`].
//!
//! ```text
//!   store write ──► EventBroadcaster (tokio broadcast) ──► watcher ──► work queue
//! ```

pub mod broadcaster;
pub mod types;

pub use broadcaster::EventBroadcaster;
pub use types::{ObjectEvent, ObjectEventType};
