//! Reconciliation of `TemplateUpdateRequest`s.
//!
//! A request names the `MasterUserRecord` or `Space` it drives; both share
//! the request's name. Each pass reads the current state of the request and
//! its target, then writes at most one target update and one status update:
//! - workspace targets: wait for the tier hash label to move away from the
//!   request's hash while the space is ready
//! - account targets: capture the sync index baseline, rewrite the template
//!   refs, then wait for every baseline sync index to move while the record
//!   is ready

mod account;
mod error;
pub mod merge;
mod space;
pub mod status;
pub mod sync_index;

use std::time::Duration;

use tiersync_core::{MasterUserRecord, Resource, Space, TemplateUpdateRequest, UpdateTarget};
use tiersync_storage::{Api, DynStore, StorageError};
use tracing::{debug, error, instrument, warn};

use crate::config::ControllerSettings;

pub use error::{MutationError, ReconcileError};
pub use status::RequestCondition;

/// What the work queue should do after a successful pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Action {
    pub requeue_after: Option<Duration>,
}

impl Action {
    /// Nothing to schedule: the next change event triggers the next pass.
    pub fn await_change() -> Self {
        Self { requeue_after: None }
    }

    pub fn requeue(after: Duration) -> Self {
        Self {
            requeue_after: Some(after),
        }
    }
}

pub struct Reconciler {
    requests: Api<TemplateUpdateRequest>,
    accounts: Api<MasterUserRecord>,
    spaces: Api<Space>,
    failure_threshold: u32,
    retry_delay: Duration,
}

impl Reconciler {
    pub fn new(store: DynStore, settings: &ControllerSettings) -> Self {
        Self {
            requests: Api::new(store.clone()),
            accounts: Api::new(store.clone()),
            spaces: Api::new(store),
            failure_threshold: settings.failure_threshold,
            retry_delay: settings.retry_delay(),
        }
    }

    pub fn requests(&self) -> &Api<TemplateUpdateRequest> {
        &self.requests
    }

    /// Runs one pass for the request named `name`.
    #[instrument(skip(self, name), fields(request = %name))]
    pub async fn reconcile(&self, name: &str) -> Result<Action, ReconcileError> {
        debug!("Reconciling TemplateUpdateRequest");

        let request = match self.requests.get(name).await {
            Ok(Some(request)) => request,
            // Deleted after the event was queued.
            Ok(None) => return Ok(Action::await_change()),
            Err(e) => {
                error!(error = %e, category = %e.category(), "unable to get the current TemplateUpdateRequest");
                return Err(ReconcileError::fetch(TemplateUpdateRequest::KIND, name, e));
            }
        };

        match request.spec.target.clone() {
            UpdateTarget::Workspace { current_tier_hash } => {
                self.reconcile_space(request, &current_tier_hash).await
            }
            UpdateTarget::Account => self.reconcile_account(request).await,
        }
    }

    /// Fetches the target of the same name. Missing targets are `Ok(None)`.
    async fn fetch_target<K: Resource>(
        &self,
        api: &Api<K>,
        name: &str,
    ) -> Result<Option<K>, ReconcileError> {
        api.get(name).await.map_err(|e| {
            error!(kind = K::KIND, error = %e, "unable to get the target of the TemplateUpdateRequest");
            ReconcileError::fetch(K::KIND, name, e)
        })
    }

    async fn write_status(
        &self,
        request: &TemplateUpdateRequest,
    ) -> Result<TemplateUpdateRequest, ReconcileError> {
        self.requests.update_status(request).await.map_err(|e| {
            error!(error = %e, "unable to update the TemplateUpdateRequest status");
            ReconcileError::status_update(request.name(), e)
        })
    }

    /// Records that the request's target is gone. Terminal for this pass.
    async fn target_missing(
        &self,
        mut request: TemplateUpdateRequest,
    ) -> Result<Action, ReconcileError> {
        let kind = request.spec.target.kind();
        let err = StorageError::not_found(kind, request.name());
        warn!(kind, "target not found, marking the TemplateUpdateRequest as failed");
        status::mark_failed(&mut request.status, err.to_string());
        self.write_status(&request).await?;
        Ok(Action::await_change())
    }
}
