//! Execution tracker unit tests

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;

use carecrm_workflows::errors::WorkflowError;
use carecrm_workflows::manager::WorkflowManager;
use carecrm_workflows::models::execution::ExecutionStatus;
use carecrm_workflows::models::workflow::WorkflowStatus;
use carecrm_workflows::storage::backend::MemoryBackend;
use carecrm_workflows::store::{LoadSource, WorkflowStore};
use carecrm_workflows::tracker::{
    plan_execution, ExecutionContext, ExecutionSummary, ExecutionTracker,
};

const KEY: &str = "workflow_executions";

#[tokio::test]
async fn test_seed_history_and_summary() {
    let backend = Arc::new(MemoryBackend::new());
    let (tracker, source) = ExecutionTracker::open(backend, KEY).await;

    assert_eq!(source, LoadSource::SeedMissing);
    assert_eq!(
        tracker.summary(),
        ExecutionSummary {
            total: 3,
            pending: 0,
            in_progress: 1,
            completed: 1,
            failed: 1,
        }
    );
    assert_eq!(tracker.with_status(ExecutionStatus::Failed)[0].id, "exec-3");
}

#[tokio::test]
async fn test_for_workflow_is_newest_first() {
    let backend = Arc::new(MemoryBackend::new());
    let (tracker, _) = ExecutionTracker::open(backend, KEY).await;

    let ids: Vec<&str> = tracker
        .for_workflow("wf-1")
        .iter()
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(ids, vec!["exec-3", "exec-1"]);
    assert_eq!(tracker.latest_for_workflow("wf-1").unwrap().id, "exec-3");
    assert!(tracker.for_workflow("wf-4").is_empty());
    assert!(tracker.latest_for_workflow("wf-4").is_none());
}

#[tokio::test]
async fn test_deleted_workflow_leaves_orphans() {
    let backend = Arc::new(MemoryBackend::new());
    let (store, _) = WorkflowStore::open(backend.clone(), "workflows").await;
    let mut manager = WorkflowManager::new(store);
    let (tracker, _) = ExecutionTracker::open(backend, KEY).await;

    assert!(tracker.orphaned(manager.workflows()).is_empty());

    manager.delete("wf-1").await.unwrap();
    let orphans: Vec<&str> = tracker
        .orphaned(manager.workflows())
        .iter()
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(orphans.len(), 2);
    assert!(orphans.contains(&"exec-1"));
    assert!(orphans.contains(&"exec-3"));
}

#[tokio::test]
async fn test_record_persists_and_rejects_duplicates() {
    let backend = Arc::new(MemoryBackend::new());
    let (store, _) = WorkflowStore::open(backend.clone(), "workflows").await;
    let mut manager = WorkflowManager::new(store);
    let (mut tracker, _) = ExecutionTracker::open(backend.clone(), KEY).await;

    let workflow = manager.activate("wf-2").await.unwrap();
    let ctx = ExecutionContext {
        patient_id: Some("patient-330".to_string()),
        appointment_id: Some("appt-12".to_string()),
        data: json!({ "appointment": { "type": "in_person" } }),
    };
    let exec = plan_execution(&workflow, &ctx, Utc::now()).unwrap();
    tracker.record(exec.clone()).await.unwrap();

    assert_eq!(tracker.get(&exec.id), Some(&exec));
    assert_eq!(tracker.summary().pending, 1);

    let err = tracker.record(exec.clone()).await.unwrap_err();
    assert!(matches!(err, WorkflowError::ValidationError(_)));
    assert_eq!(tracker.all().len(), 4);

    let (reopened, source) = ExecutionTracker::open(backend, KEY).await;
    assert_eq!(source, LoadSource::Persisted);
    assert_eq!(reopened.get(&exec.id), Some(&exec));
}

#[tokio::test]
async fn test_failed_record_is_not_kept() {
    let backend = Arc::new(MemoryBackend::new());
    let (mut tracker, _) = ExecutionTracker::open(backend.clone(), KEY).await;
    let mut exec = tracker.get("exec-2").unwrap().clone();
    exec.id = "exec-9".to_string();

    backend.set_fail_writes(true);
    assert!(tracker.record(exec).await.is_err());
    assert_eq!(tracker.all().len(), 3);
    assert!(tracker.get("exec-9").is_none());
}

#[tokio::test]
async fn test_remove_for_workflow() {
    let backend = Arc::new(MemoryBackend::new());
    let (mut tracker, _) = ExecutionTracker::open(backend.clone(), KEY).await;

    assert_eq!(tracker.remove_for_workflow("wf-1").await.unwrap(), 2);
    assert_eq!(tracker.all().len(), 1);

    let writes = backend.write_count();
    assert_eq!(tracker.remove_for_workflow("wf-1").await.unwrap(), 0);
    assert_eq!(backend.write_count(), writes);
}

#[tokio::test]
async fn test_planned_actions_follow_step_delays() {
    let backend = Arc::new(MemoryBackend::new());
    let (store, _) = WorkflowStore::open(backend, "workflows").await;
    let mut manager = WorkflowManager::new(store);

    let now = Utc::now();
    let draft = manager.get("wf-3").unwrap().clone();
    assert!(plan_execution(&draft, &ExecutionContext::default(), now).is_err());

    let active = manager.set_status("wf-3", WorkflowStatus::Active).await.unwrap();
    let exec = plan_execution(&active, &ExecutionContext::default(), now).unwrap();
    assert_eq!(exec.workflow_id, "wf-3");
    assert_eq!(exec.actions.len(), active.steps.len());
    assert!(exec.actions.iter().all(|a| a.scheduled_for >= now));
    assert!(exec
        .actions
        .windows(2)
        .all(|pair| pair[0].scheduled_for <= pair[1].scheduled_for));
    let total = Duration::days(i64::try_from(active.total_delay_days()).unwrap());
    assert_eq!(exec.actions.last().map(|a| a.scheduled_for), Some(now + total));
}
