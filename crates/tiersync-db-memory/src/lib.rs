//! In-memory object store backend for tiersync.
//!
//! This crate provides an in-memory implementation of the `ObjectStore` trait
//! from `tiersync-storage`, using a papaya lock-free HashMap for reads.
//!
//! # Example
//!
//! ```ignore
//! use tiersync_db_memory::InMemoryStore;
//! use tiersync_storage::ObjectStore;
//!
//! let store = InMemoryStore::new();
//! let space = serde_json::json!({
//!     "metadata": {"name": "ws-1"},
//!     "spec": {"tierName": "base", "targetCluster": "member-1"}
//! });
//! let created = store.create("Space", &space).await?;
//! assert_eq!(created.generation, 1);
//! ```

mod store_impl;
pub mod storage;

pub use storage::{InMemoryStore, StorageKey};
pub use tiersync_storage::{ObjectStore, StorageError, StoredObject};
