use tiersync_core::{MasterUserRecord, Resource, TemplateUpdateRequest};
use tracing::{debug, error, info, warn};

use super::error::MutationError;
use super::{Action, ReconcileError, Reconciler, merge, status, sync_index};

impl Reconciler {
    /// First pass: capture the sync index baseline, then rewrite the record's
    /// template refs. Later passes: wait for convergence.
    pub(super) async fn reconcile_account(
        &self,
        mut request: TemplateUpdateRequest,
    ) -> Result<Action, ReconcileError> {
        let name = request.name().to_string();
        let Some(mut mur) = self.fetch_target(&self.accounts, &name).await? else {
            return self.target_missing(request).await;
        };
        let tier_name = request.spec.tier_name.clone();

        if request.status.sync_indexes.is_empty() {
            // Abandoned requests leave the record alone.
            if status::failure_threshold_reached(&request.status, self.failure_threshold) {
                debug!(
                    failures = request.status.failure_count,
                    threshold = self.failure_threshold,
                    "TemplateUpdateRequest was abandoned, skipping the MasterUserRecord update"
                );
                return Ok(Action::await_change());
            }

            // Captured before the rewrite, which replaces the fields read here.
            let baseline = sync_index::snapshot(&tier_name, &mur);

            if let Err(err) = self.update_template_refs(&request, &mut mur).await {
                error!(tier = %tier_name, error = %err, "Unable to update the MasterUserRecord associated with the TemplateUpdateRequest");
                status::mark_failed(
                    &mut request.status,
                    format!("unable to update the MasterUserRecord associated with the TemplateUpdateRequest: {err}"),
                );
                self.write_status(&request).await?;

                if status::failure_threshold_reached(&request.status, self.failure_threshold) {
                    warn!(
                        failures = request.status.failure_count,
                        threshold = self.failure_threshold,
                        "Giving up on the MasterUserRecord update"
                    );
                    return Ok(Action::await_change());
                }
                info!(
                    failures = request.status.failure_count,
                    retry_after = ?self.retry_delay,
                    "Retaining the failure in the TemplateUpdateRequest status"
                );
                return Err(ReconcileError::UpdateFailed {
                    name,
                    retry_after: self.retry_delay,
                    source: err,
                });
            }

            info!(tier = %tier_name, clusters = baseline.len(), "MasterUserRecord update started");
            status::mark_updating(&mut request.status, baseline);
            self.write_status(&request).await?;
            return Ok(Action::await_change());
        }

        let current = sync_index::snapshot(&tier_name, &mur);
        if let Some((target_cluster, sync_index)) =
            sync_index::first_unchanged(&request.status.sync_indexes, &current)
        {
            info!(target_cluster, sync_index, "Sync index still unchanged");
            return Ok(Action::await_change());
        }
        if !mur.is_ready() {
            info!("All sync indexes have been updated, waiting for the MasterUserRecord to be ready");
            return Ok(Action::await_change());
        }

        info!("MasterUserRecord is up-to-date. Marking the TemplateUpdateRequest as complete");
        status::mark_complete(&mut request.status);
        self.write_status(&request).await?;
        Ok(Action::await_change())
    }

    /// Rewrites the record's refs and persists it in a single write.
    async fn update_template_refs(
        &self,
        request: &TemplateUpdateRequest,
        mur: &mut MasterUserRecord,
    ) -> Result<(), MutationError> {
        let updated = merge::update_template_refs(&request.spec, mur)?;
        info!(accounts = updated, "updating the MasterUserRecord");
        self.accounts.update(mur).await?;
        Ok(())
    }
}
