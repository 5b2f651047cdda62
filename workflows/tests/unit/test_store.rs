//! Store unit tests

use std::sync::Arc;

use carecrm_workflows::manager::WorkflowManager;
use carecrm_workflows::models::workflow::{
    ConditionOperator, NewWorkflow, StepType, Workflow, WorkflowStatus,
};
use carecrm_workflows::storage::backend::{FileBackend, MemoryBackend, StorageBackend};
use carecrm_workflows::store::seed::sample_workflows;
use carecrm_workflows::store::{LoadSource, WorkflowStore};

const KEY: &str = "workflows";

#[tokio::test]
async fn test_missing_key_loads_seed() {
    let backend = Arc::new(MemoryBackend::new());
    let (store, source) = WorkflowStore::open(backend.clone(), KEY).await;

    assert_eq!(source, LoadSource::SeedMissing);
    assert_eq!(store.workflows(), sample_workflows().as_slice());
    // Loading alone does not write
    assert_eq!(backend.write_count(), 0);
}

#[tokio::test]
async fn test_corrupt_value_loads_seed() {
    let backend = Arc::new(MemoryBackend::new());
    backend.insert_raw(KEY, "[{\"id\": 42}");

    let (store, source) = WorkflowStore::open(backend, KEY).await;
    assert!(matches!(source, LoadSource::SeedCorrupt { .. }));
    assert_eq!(store.len(), 4);
}

#[tokio::test]
async fn test_unreadable_backend_loads_seed() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_fail_reads(true);

    let (store, source) = WorkflowStore::open(backend, KEY).await;
    assert!(matches!(source, LoadSource::SeedUnreadable { .. }));
    assert_eq!(store.len(), 4);
}

#[tokio::test]
async fn test_persisted_collection_wins_over_seed() {
    let backend = Arc::new(MemoryBackend::new());
    let mut only = sample_workflows();
    only.truncate(2);
    backend.insert_raw(KEY, &serde_json::to_string(&only).unwrap());

    let (store, source) = WorkflowStore::open(backend, KEY).await;
    assert_eq!(source, LoadSource::Persisted);
    assert_eq!(store.ids(), vec!["wf-1", "wf-2"]);
}

#[tokio::test]
async fn test_save_writes_whole_collection_as_json_array() {
    let backend = Arc::new(MemoryBackend::new());
    let store = WorkflowStore::new(backend.clone(), KEY);

    store.save(&sample_workflows()).await.unwrap();

    let raw = backend.raw(KEY).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let items = value.as_array().unwrap();
    assert_eq!(items.len(), 4);
    assert_eq!(items[0]["id"], "wf-1");
    assert_eq!(items[0]["createdAt"], "2024-01-15T09:00:00Z");
    assert!(items[2].get("lastRun").is_none());
    // save never touches memory
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_save_failure_is_returned() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_fail_writes(true);
    let store = WorkflowStore::new(backend, KEY);

    let err = store.save(&sample_workflows()).await.unwrap_err();
    assert!(err.is_persistence());
}

#[tokio::test]
async fn test_file_backend_survives_reopen() {
    let dir = std::env::temp_dir().join(format!("carecrm-store-{}", uuid::Uuid::new_v4()));
    let backend: Arc<dyn StorageBackend> = Arc::new(FileBackend::new(&dir));

    let (mut store, _) = WorkflowStore::open(backend.clone(), KEY).await;
    let mut next = store.workflows().to_vec();
    next[2].status = WorkflowStatus::Active;
    store.commit(next).await.unwrap();

    let (reopened, source) = WorkflowStore::open(backend, KEY).await;
    assert_eq!(source, LoadSource::Persisted);
    assert_eq!(reopened.get("wf-3").map(|w| w.status), Some(WorkflowStatus::Active));
}

#[tokio::test]
async fn test_legacy_shape_loads() {
    let backend = Arc::new(MemoryBackend::new());
    backend.insert_raw(
        KEY,
        r#"[{
            "id": "wf-legacy",
            "name": "Birthday Greeting",
            "status": "active",
            "trigger": "patient_birthday",
            "actions": [{ "id": "a1", "type": "email", "config": { "template": "birthday" } }],
            "createdAt": "2023-05-01T00:00:00Z",
            "updatedAt": "2023-05-01T00:00:00Z",
            "lastRunAt": "2023-06-01T00:00:00Z"
        }]"#,
    );

    let (store, source) = WorkflowStore::open(backend, KEY).await;
    assert_eq!(source, LoadSource::Persisted);
    let wf: &Workflow = store.get("wf-legacy").unwrap();
    assert_eq!(wf.steps.len(), 1);
    assert_eq!(wf.steps[0].config["template"], "birthday");
    assert!(wf.last_run.is_some());
    assert!(wf.description.is_empty());
}

#[tokio::test]
async fn test_steps_without_ids_and_unknown_operators_are_kept() {
    let backend = Arc::new(MemoryBackend::new());
    backend.insert_raw(
        KEY,
        r#"[{
            "id": "wf-user",
            "name": "Pediatric Vaccination Reminder",
            "description": "Reminds parents about upcoming shots",
            "status": "active",
            "trigger": "patient_birthday",
            "steps": [
                { "type": "email", "config": { "template": "vaccine_due" }, "delayDays": 1 },
                { "type": "voicemail", "config": {} }
            ],
            "conditions": [{ "field": "patient.age", "operator": "in", "value": [1, 2] }],
            "createdAt": "2024-04-01T00:00:00Z",
            "updatedAt": "2024-04-01T00:00:00Z",
            "createdBy": "dr.lee"
        }]"#,
    );

    let (store, source) = WorkflowStore::open(backend.clone(), KEY).await;
    assert_eq!(source, LoadSource::Persisted);
    assert_eq!(store.ids(), vec!["wf-user"]);

    let wf = store.get("wf-user").unwrap();
    assert_eq!(wf.steps[0].id, "wf-user-s1");
    assert_eq!(wf.steps[1].id, "wf-user-s2");
    assert_eq!(wf.steps[1].step_type, StepType::Other("voicemail".to_string()));
    assert_eq!(wf.conditions[0].operator, ConditionOperator::Other("in".to_string()));
    assert!(!wf.conditions_met(&serde_json::json!({ "patient": { "age": 1 } })));

    let mut manager = WorkflowManager::new(store);
    manager.create(NewWorkflow::named("Flu Shot Campaign")).await.unwrap();

    let persisted: Vec<Workflow> =
        serde_json::from_str(&backend.raw(KEY).unwrap()).unwrap();
    assert_eq!(persisted.len(), 2);
    assert_eq!(persisted[0].id, "wf-user");
    assert_eq!(persisted[0].steps[1].step_type, StepType::Other("voicemail".to_string()));
    let raw = backend.raw(KEY).unwrap();
    assert!(raw.contains("\"operator\":\"in\""));
}
