use tiersync_core::{Resource, TemplateUpdateRequest, tier_hash_label_key};
use tracing::info;

use super::{Action, ReconcileError, Reconciler, status};

impl Reconciler {
    /// The space is up to date once its tier hash label no longer holds
    /// `current_tier_hash` and it reports ready.
    pub(super) async fn reconcile_space(
        &self,
        mut request: TemplateUpdateRequest,
        current_tier_hash: &str,
    ) -> Result<Action, ReconcileError> {
        let Some(space) = self.fetch_target(&self.spaces, request.name()).await? else {
            return self.target_missing(request).await;
        };

        // The label key follows the tier declared on the space itself.
        let label_key = tier_hash_label_key(&space.spec.tier_name);
        let applied_hash = space.metadata.label(&label_key);

        if applied_hash != Some(current_tier_hash) && space.is_ready() {
            info!("Space is up-to-date. Marking the TemplateUpdateRequest as complete");
            status::mark_complete(&mut request.status);
            self.write_status(&request).await?;
            return Ok(Action::await_change());
        }

        info!(applied_hash = ?applied_hash, ready = space.is_ready(), "Space still being updated...");
        status::mark_updating(&mut request.status, Default::default());
        self.write_status(&request).await?;
        Ok(Action::await_change())
    }
}
