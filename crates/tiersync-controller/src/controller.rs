//! Watch loop and worker pool driving the [`Reconciler`].
//!
//! ```text
//!   ObjectEvent ──► watch ──► WorkQueue ──► worker × N ──► Reconciler::reconcile
//!                                ▲                              │
//!                                └──── requeue / backoff ◄──────┘
//! ```

use std::future::Future;
use std::sync::Arc;

use tiersync_core::events::ObjectEvent;
use tiersync_core::{MasterUserRecord, Resource, Space, TemplateUpdateRequest};
use tiersync_storage::StorageResult;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::ControllerSettings;
use crate::queue::WorkQueue;
use crate::reconcile::Reconciler;

/// Queue key for an event, or `None` when the event is filtered out.
///
/// Request events only count when the generation moved, so the controller's
/// own status writes don't trigger another pass. Any change to an account
/// record or a space queues the request of the same name.
pub fn event_key(event: &ObjectEvent) -> Option<&str> {
    let relevant = if event.is_kind(TemplateUpdateRequest::KIND) {
        event.generation_changed()
    } else {
        event.is_kind(MasterUserRecord::KIND) || event.is_kind(Space::KIND)
    };
    relevant.then_some(event.name.as_str())
}

pub struct Controller {
    reconciler: Arc<Reconciler>,
    queue: Arc<WorkQueue>,
    settings: ControllerSettings,
}

impl Controller {
    pub fn new(reconciler: Reconciler, settings: ControllerSettings) -> Self {
        Self::with_queue(reconciler, settings, WorkQueue::new_shared())
    }

    pub fn with_queue(
        reconciler: Reconciler,
        settings: ControllerSettings,
        queue: Arc<WorkQueue>,
    ) -> Self {
        Self {
            reconciler: Arc::new(reconciler),
            queue,
            settings,
        }
    }

    pub fn queue(&self) -> &Arc<WorkQueue> {
        &self.queue
    }

    /// Queues every existing request.
    pub async fn resync(&self) -> StorageResult<usize> {
        resync(&self.reconciler, &self.queue).await
    }

    /// Runs the watch loop and the workers until `shutdown` resolves or the
    /// event channel closes.
    pub async fn run<F>(self, events: broadcast::Receiver<ObjectEvent>, shutdown: F) -> StorageResult<()>
    where
        F: Future<Output = ()>,
    {
        let queued = self.resync().await?;
        info!(
            requests = queued,
            workers = self.settings.workers,
            "Starting TemplateUpdateRequest controller"
        );

        let mut workers = JoinSet::new();
        for id in 0..self.settings.workers {
            workers.spawn(worker(id, self.reconciler.clone(), self.queue.clone()));
        }
        let mut watcher = tokio::spawn(watch(
            events,
            self.reconciler.clone(),
            self.queue.clone(),
            self.settings.resync_on_lag,
        ));

        tokio::select! {
            _ = shutdown => info!("Shutdown requested"),
            _ = &mut watcher => info!("Change feed closed"),
        }

        self.queue.shutdown();
        watcher.abort();
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Worker task failed");
            }
        }
        info!("TemplateUpdateRequest controller stopped");
        Ok(())
    }
}

async fn resync(reconciler: &Reconciler, queue: &WorkQueue) -> StorageResult<usize> {
    let requests = reconciler.requests().list().await?;
    for request in &requests {
        queue.add(request.name());
    }
    Ok(requests.len())
}

async fn watch(
    mut receiver: broadcast::Receiver<ObjectEvent>,
    reconciler: Arc<Reconciler>,
    queue: Arc<WorkQueue>,
    resync_on_lag: bool,
) {
    loop {
        match receiver.recv().await {
            Ok(event) => {
                if let Some(key) = event_key(&event) {
                    debug!(kind = %event.kind, name = %event.name, event_type = %event.event_type, "Queueing request");
                    queue.add(key);
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "Watch lagged, missed events");
                if resync_on_lag {
                    match resync(&reconciler, &queue).await {
                        Ok(count) => info!(requests = count, "Resynced after lag"),
                        Err(e) => error!(error = %e, "Resync after lag failed"),
                    }
                }
            }
            Err(broadcast::error::RecvError::Closed) => {
                info!("Watch channel closed, stopping");
                break;
            }
        }
    }
}

async fn worker(id: usize, reconciler: Arc<Reconciler>, queue: Arc<WorkQueue>) {
    debug!(worker = id, "Worker started");
    while let Some(name) = queue.get().await {
        match reconciler.reconcile(&name).await {
            Ok(action) => {
                queue.forget(&name);
                if let Some(after) = action.requeue_after {
                    queue.add_after(&name, after);
                }
            }
            Err(e) => match e.retry_after() {
                Some(after) => {
                    warn!(request = %name, error = %e, retry_after = ?after, "Reconcile failed, retrying after delay");
                    queue.add_after(&name, after);
                }
                None if e.is_conflict() => {
                    debug!(request = %name, error = %e, "Write conflict, requeueing with backoff");
                    queue.add_rate_limited(&name);
                }
                None => {
                    warn!(
                        request = %name,
                        error = %e,
                        requeues = queue.num_requeues(&name),
                        "Reconcile failed, requeueing with backoff"
                    );
                    queue.add_rate_limited(&name);
                }
            },
        }
        queue.done(&name);
    }
    debug!(worker = id, "Worker stopped");
}
