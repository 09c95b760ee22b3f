use std::time::Duration;

use thiserror::Error;
use tiersync_core::CoreError;
use tiersync_storage::StorageError;

/// Errors returned to the work queue by a reconcile pass.
///
/// Every variant is retryable. [`ReconcileError::retry_after`] tells the
/// queue when a fixed delay applies instead of the per-key backoff.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("unable to get {kind} '{name}': {source}")]
    Fetch {
        kind: &'static str,
        name: String,
        #[source]
        source: StorageError,
    },

    #[error("unable to update the TemplateUpdateRequest '{name}' status: {source}")]
    StatusUpdate {
        name: String,
        #[source]
        source: StorageError,
    },

    #[error("unable to update the MasterUserRecord associated with the TemplateUpdateRequest '{name}': {source}")]
    UpdateFailed {
        name: String,
        retry_after: Duration,
        #[source]
        source: MutationError,
    },
}

impl ReconcileError {
    pub fn fetch(kind: &'static str, name: impl Into<String>, source: StorageError) -> Self {
        Self::Fetch {
            kind,
            name: name.into(),
            source,
        }
    }

    pub fn status_update(name: impl Into<String>, source: StorageError) -> Self {
        Self::StatusUpdate {
            name: name.into(),
            source,
        }
    }

    /// Explicit requeue delay, if the failure asks for one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::UpdateFailed { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Fetch { source, .. } | Self::StatusUpdate { source, .. } => {
                source.is_version_conflict()
            }
            Self::UpdateFailed { source, .. } => {
                matches!(source, MutationError::Storage(e) if e.is_version_conflict())
            }
        }
    }
}

/// Why rewriting an account's template references failed.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error(transparent)]
    Template(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
