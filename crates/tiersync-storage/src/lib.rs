//! # tiersync-storage
//!
//! Storage abstraction layer for the tiersync controller.
//!
//! This crate defines the traits and types that storage backends implement;
//! backends live in separate crates.
//!
//! - [`ObjectStore`]: versioned create/read/list/update/update_status/delete
//! - [`EventedStore`]: wrapper publishing change events after writes
//! - [`Api`]: typed access for one [`tiersync_core::Resource`] kind
//!
//! ```ignore
//! use tiersync_storage::{Api, DynStore};
//! use tiersync_core::Space;
//!
//! async fn tier_of(store: DynStore, name: &str) -> StorageResult<Option<String>> {
//!     let spaces: Api<Space> = Api::new(store);
//!     Ok(spaces.get(name).await?.map(|s| s.spec.tier_name))
//! }
//! ```

mod error;
pub mod evented;
mod traits;
pub mod typed;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use evented::EventedStore;
pub use traits::ObjectStore;
pub use typed::Api;
pub use types::{StoredObject, WriteOutcome, object_name};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared store trait object.
pub type DynStore = std::sync::Arc<dyn ObjectStore>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use tiersync_storage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ErrorCategory, StorageError};
    pub use crate::evented::EventedStore;
    pub use crate::traits::ObjectStore;
    pub use crate::typed::Api;
    pub use crate::types::{StoredObject, WriteOutcome};
    pub use crate::{DynStore, StorageResult};
}
