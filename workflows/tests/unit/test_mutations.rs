//! Mutation unit tests

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};

use carecrm_workflows::errors::WorkflowError;
use carecrm_workflows::filter::WorkflowFilters;
use carecrm_workflows::manager::WorkflowManager;
use carecrm_workflows::models::workflow::{
    NewWorkflow, StepType, WorkflowPatch, WorkflowStatus, WorkflowStep,
};
use carecrm_workflows::notify::{NotificationVariant, RecordingNotifier};
use carecrm_workflows::storage::backend::MemoryBackend;
use carecrm_workflows::store::WorkflowStore;
use carecrm_workflows::utils::ManualClock;

struct Fixture {
    manager: WorkflowManager,
    backend: Arc<MemoryBackend>,
    notifier: Arc<RecordingNotifier>,
    clock: Arc<ManualClock>,
}

async fn fixture() -> Fixture {
    let backend = Arc::new(MemoryBackend::new());
    let (store, _) = WorkflowStore::open(backend.clone(), "workflows").await;
    let notifier = Arc::new(RecordingNotifier::new());
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let manager = WorkflowManager::new(store)
        .with_notifier(notifier.clone())
        .with_clock(clock.clone());

    Fixture {
        manager,
        backend,
        notifier,
        clock,
    }
}

#[tokio::test]
async fn test_create_assigns_unique_id_and_equal_timestamps() {
    let mut f = fixture().await;
    let mut seen: HashSet<String> = f.manager.store().ids().into_iter().collect();

    for i in 0..20 {
        let created = f
            .manager
            .create(NewWorkflow::named(format!("Recall batch {}", i)))
            .await
            .unwrap();
        assert!(seen.insert(created.id.clone()), "duplicate id {}", created.id);
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(created.status, WorkflowStatus::Draft);
        assert_eq!(created.trigger, "manual");
        assert!(created.steps.is_empty());
    }

    assert_eq!(f.manager.workflows().len(), 24);
    let last = f.notifier.last().unwrap();
    assert_eq!(last.title, "Workflow created");
    assert_eq!(last.variant, NotificationVariant::Default);
}

#[tokio::test]
async fn test_create_persists_before_returning() {
    let mut f = fixture().await;
    let created = f
        .manager
        .create(NewWorkflow {
            name: Some("Lab Results Ready".to_string()),
            trigger: Some("lab_result_posted".to_string()),
            steps: Some(vec![WorkflowStep::new("s1", StepType::Sms)]),
            ..Default::default()
        })
        .await
        .unwrap();

    let raw = f.backend.raw("workflows").unwrap();
    assert!(raw.contains(&created.id));
    assert!(raw.contains("lab_result_posted"));
}

#[tokio::test]
async fn test_update_preserves_absent_fields_and_advances_updated_at() {
    let mut f = fixture().await;
    let before = f.manager.get("wf-2").unwrap().clone();

    f.clock.advance(Duration::seconds(5));
    let updated = f
        .manager
        .update(
            "wf-2",
            WorkflowPatch {
                description: Some("Reminders 48h ahead".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.description, "Reminders 48h ahead");
    assert_eq!(updated.name, before.name);
    assert_eq!(updated.status, before.status);
    assert_eq!(updated.trigger, before.trigger);
    assert_eq!(updated.steps, before.steps);
    assert_eq!(updated.conditions, before.conditions);
    assert_eq!(updated.created_at, before.created_at);
    assert_eq!(updated.last_run, before.last_run);
    assert!(updated.updated_at > before.updated_at);

    f.clock.advance(Duration::seconds(1));
    let again = f.manager.update("wf-2", WorkflowPatch::default()).await.unwrap();
    assert!(again.updated_at > updated.updated_at);
}

#[tokio::test]
async fn test_set_status_scenario() {
    let mut f = fixture().await;
    let before = f.manager.get("wf-3").unwrap().updated_at;

    f.manager.set_status("wf-3", WorkflowStatus::Active).await.unwrap();

    f.manager
        .set_filters(WorkflowFilters::default().with_status(WorkflowStatus::Active));
    let active = f.manager.filtered();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, "wf-3");
    assert_eq!(active[0].status, WorkflowStatus::Active);
    assert!(active[0].updated_at > before);

    assert_eq!(f.notifier.last().unwrap().title, "Workflow activated");
}

#[tokio::test]
async fn test_activate_pause_cycle() {
    let mut f = fixture().await;
    assert_eq!(f.manager.activate("wf-4").await.unwrap().status, WorkflowStatus::Active);
    assert_eq!(f.manager.pause("wf-4").await.unwrap().status, WorkflowStatus::Paused);
    assert_eq!(f.manager.activate("wf-4").await.unwrap().status, WorkflowStatus::Active);
    assert_eq!(
        f.manager.deactivate("wf-4").await.unwrap().status,
        WorkflowStatus::Inactive
    );
}

#[tokio::test]
async fn test_activate_with_no_steps_is_allowed() {
    let mut f = fixture().await;
    let created = f.manager.create(NewWorkflow::named("Empty")).await.unwrap();
    let active = f.manager.activate(&created.id).await.unwrap();
    assert_eq!(active.status, WorkflowStatus::Active);
}

#[tokio::test]
async fn test_duplicate_scenario() {
    let mut f = fixture().await;
    let original = f.manager.get("wf-1").unwrap().clone();
    assert!(original.last_run.is_some());

    let copy = f.manager.duplicate("wf-1").await.unwrap();

    assert_eq!(copy.name, format!("{} (Copy)", original.name));
    assert_eq!(copy.status, WorkflowStatus::Draft);
    assert_ne!(copy.id, original.id);
    assert!(copy.last_run.is_none());
    assert_eq!(copy.steps, original.steps);
    assert_eq!(copy.created_at, copy.updated_at);
    assert_eq!(f.manager.get(&copy.id), Some(&copy));
    // the original is untouched
    assert_eq!(f.manager.get("wf-1"), Some(&original));
}

#[tokio::test]
async fn test_delete_twice_is_noop() {
    let mut f = fixture().await;

    assert!(f.manager.delete("wf-2").await.unwrap());
    assert_eq!(f.manager.workflows().len(), 3);
    let writes = f.backend.write_count();
    let notices = f.notifier.notifications().len();

    assert!(!f.manager.delete("wf-2").await.unwrap());
    assert_eq!(f.manager.workflows().len(), 3);
    assert_eq!(f.backend.write_count(), writes);
    assert_eq!(f.notifier.notifications().len(), notices);
}

#[tokio::test]
async fn test_not_found_is_reported() {
    let mut f = fixture().await;

    let err = f
        .manager
        .update("wf-404", WorkflowPatch::status(WorkflowStatus::Active))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NotFound(_)));
    assert!(f.notifier.last().unwrap().is_failure());

    assert!(matches!(
        f.manager.duplicate("wf-404").await,
        Err(WorkflowError::NotFound(_))
    ));
    assert!(matches!(
        f.manager.activate("wf-404").await,
        Err(WorkflowError::NotFound(_))
    ));
    assert_eq!(f.manager.workflows().len(), 4);
}

#[tokio::test]
async fn test_failed_save_leaves_collection_untouched() {
    let mut f = fixture().await;
    let before = f.manager.workflows().to_vec();
    f.backend.set_fail_writes(true);
    f.clock.advance(Duration::minutes(1));

    assert!(f.manager.create(NewWorkflow::named("Flu Shot Campaign")).await.is_err());
    assert!(f.manager.update(
        "wf-1",
        WorkflowPatch {
            name: Some("Renamed".to_string()),
            ..Default::default()
        },
    )
    .await
    .is_err());
    assert!(f.manager.activate("wf-3").await.is_err());
    assert!(f.manager.duplicate("wf-1").await.is_err());
    assert!(f.manager.delete("wf-2").await.is_err());

    assert_eq!(f.manager.workflows(), before.as_slice());

    let notices = f.notifier.drain();
    assert_eq!(notices.len(), 5);
    assert!(notices.iter().all(|n| n.is_failure()));
    assert_eq!(notices[0].title, "Error creating workflow");

    // the same operation succeeds once storage recovers
    f.backend.set_fail_writes(false);
    f.manager.create(NewWorkflow::named("Flu Shot Campaign")).await.unwrap();
    assert_eq!(f.manager.workflows().len(), before.len() + 1);
}

#[tokio::test]
async fn test_quota_exceeded_is_surfaced() {
    let mut f = fixture().await;
    let current = serde_json::to_string(f.manager.workflows()).unwrap();
    f.backend.set_quota(Some(current.len()));

    let err = f
        .manager
        .create(NewWorkflow::named("One Too Many"))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::QuotaExceeded { .. }));
    assert_eq!(f.manager.workflows().len(), 4);
    assert!(f.notifier.last().unwrap().description.contains("quota"));
}
