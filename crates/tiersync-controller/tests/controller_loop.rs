//! The controller wired to an evented in-memory store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tiersync_controller::reconcile::status::current;
use tiersync_controller::{Controller, ControllerSettings, Reconciler, RequestCondition};
use tiersync_core::events::EventBroadcaster;
use tiersync_core::{
    Condition, ConditionStatus, ConditionType, MasterUserRecord, NSTemplateSetSpec, Space,
    TemplateUpdateRequest, TemplateUpdateRequestSpec, UserAccountEmbedded,
};
use tiersync_db_memory::InMemoryStore;
use tiersync_storage::{Api, DynStore, EventedStore, StorageResult};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Running {
    store: DynStore,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<StorageResult<()>>,
}

impl Running {
    async fn stop(self) {
        let _ = self.stop.send(());
        self.handle.await.unwrap().unwrap();
    }
}

fn start(broadcaster: Arc<EventBroadcaster>) -> Running {
    let store: DynStore = Arc::new(EventedStore::new(InMemoryStore::new(), broadcaster.clone()));
    let settings = ControllerSettings {
        workers: 2,
        ..ControllerSettings::default()
    };
    let controller = Controller::new(Reconciler::new(store.clone(), &settings), settings);
    let events = broadcaster.subscribe();
    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(controller.run(events, async {
        let _ = stopped.await;
    }));
    Running { store, stop, handle }
}

async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {what}");
}

fn ready() -> Condition {
    Condition::new(ConditionType::Ready, ConditionStatus::True)
}

#[tokio::test]
async fn account_request_completes_after_downstream_sync() {
    let running = start(EventBroadcaster::new_shared());
    let requests: Api<TemplateUpdateRequest> = Api::new(running.store.clone());
    let murs: Api<MasterUserRecord> = Api::new(running.store.clone());

    murs.create(
        &MasterUserRecord::new("alice")
            .with_account(UserAccountEmbedded::new(
                "member-1",
                "10",
                NSTemplateSetSpec::new("base").with_namespaces(["base-dev-old"]),
            ))
            .with_account(UserAccountEmbedded::new(
                "member-2",
                "20",
                NSTemplateSetSpec::new("base").with_namespaces(["base-dev-old"]),
            ))
            .with_condition(ready()),
    )
    .await
    .unwrap();
    requests
        .create(&TemplateUpdateRequest::new(
            "alice",
            TemplateUpdateRequestSpec::for_account("base").with_namespaces(["base-dev-new"]),
        ))
        .await
        .unwrap();

    eventually("the baseline", || async {
        requests
            .get("alice")
            .await
            .unwrap()
            .is_some_and(|r| r.status.sync_indexes.len() == 2)
    })
    .await;

    // Downstream re-applies the templates on both clusters.
    let mut mur = murs.get("alice").await.unwrap().unwrap();
    assert_eq!(
        mur.spec.user_accounts[0].spec.nstemplate_set.as_ref().unwrap().namespaces[0].template_ref,
        "base-dev-new"
    );
    mur.spec.user_accounts[0].sync_index = "11".into();
    mur.spec.user_accounts[1].sync_index = "21".into();
    murs.update(&mur).await.unwrap();

    eventually("completion", || async {
        requests
            .get("alice")
            .await
            .unwrap()
            .is_some_and(|r| r.is_complete())
    })
    .await;

    running.stop().await;
}

#[tokio::test]
async fn space_request_completes_when_label_moves() {
    let running = start(EventBroadcaster::new_shared());
    let requests: Api<TemplateUpdateRequest> = Api::new(running.store.clone());
    let spaces: Api<Space> = Api::new(running.store.clone());

    spaces
        .create(&Space::new("ws-1", "base").with_tier_hash("h1"))
        .await
        .unwrap();
    requests
        .create(&TemplateUpdateRequest::new(
            "ws-1",
            TemplateUpdateRequestSpec::for_workspace("base", "h1"),
        ))
        .await
        .unwrap();

    eventually("the updating condition", || async {
        requests
            .get("ws-1")
            .await
            .unwrap()
            .is_some_and(|r| current(&r.status) == Some(RequestCondition::Updating))
    })
    .await;

    let space = spaces.get("ws-1").await.unwrap().unwrap().with_tier_hash("h2");
    let space = spaces.update(&space).await.unwrap();
    spaces.update_status(&space.with_condition(ready())).await.unwrap();

    eventually("completion", || async {
        requests
            .get("ws-1")
            .await
            .unwrap()
            .is_some_and(|r| r.is_complete())
    })
    .await;

    running.stop().await;
}

#[tokio::test]
async fn lagging_watch_still_reconciles_every_request() {
    let running = start(EventBroadcaster::with_capacity(1).into());
    let requests: Api<TemplateUpdateRequest> = Api::new(running.store.clone());
    let spaces: Api<Space> = Api::new(running.store.clone());
    tokio::time::sleep(Duration::from_millis(20)).await;

    let names = ["ws-1", "ws-2", "ws-3"];
    for name in names {
        spaces
            .create(&Space::new(name, "base").with_tier_hash("h1"))
            .await
            .unwrap();
        requests
            .create(&TemplateUpdateRequest::new(
                name,
                TemplateUpdateRequestSpec::for_workspace("base", "h1"),
            ))
            .await
            .unwrap();
    }

    eventually("every request to be reconciled", || async {
        let all = requests.list().await.unwrap();
        all.len() == names.len() && all.iter().all(|r| current(&r.status).is_some())
    })
    .await;

    running.stop().await;
}

#[tokio::test]
async fn deleted_request_stops_quietly() {
    let running = start(EventBroadcaster::new_shared());
    let requests: Api<TemplateUpdateRequest> = Api::new(running.store.clone());

    requests
        .create(&TemplateUpdateRequest::new(
            "ws-9",
            TemplateUpdateRequestSpec::for_workspace("base", "h1"),
        ))
        .await
        .unwrap();
    eventually("the missing space to be recorded", || async {
        requests
            .get("ws-9")
            .await
            .unwrap()
            .is_some_and(|r| r.status.failure_count == 1)
    })
    .await;

    requests.delete("ws-9").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(requests.get("ws-9").await.unwrap().is_none());

    running.stop().await;
}
