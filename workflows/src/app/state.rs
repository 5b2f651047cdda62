//! Application state management

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::errors::WorkflowError;
use crate::manager::WorkflowManager;
use crate::notify::NotificationSink;
use crate::storage::backend::{FileBackend, StorageBackend};
use crate::storage::layout::StorageLayout;
use crate::storage::settings::Settings;
use crate::store::{LoadSource, WorkflowStore};
use crate::models::execution::WorkflowExecution;
use crate::tracker::{plan_execution, ExecutionContext, ExecutionTracker};

/// Everything the workflow screens need, wired to one storage backend
pub struct AppState {
    /// Active settings
    pub settings: Settings,

    /// Workflow collection and mutations
    pub workflows: WorkflowManager,

    /// Execution history
    pub executions: ExecutionTracker,
}

impl AppState {
    /// Initialize state on disk under `layout`
    pub async fn init(
        layout: &StorageLayout,
        settings: Settings,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<Self, WorkflowError> {
        info!("Initializing workflow state at {:?}", layout.base_dir);
        layout.setup().await?;
        let backend = Arc::new(FileBackend::new(layout.data_dir()));
        Ok(Self::with_backend(backend, settings, notifier).await)
    }

    /// Initialize state over any backend
    pub async fn with_backend(
        backend: Arc<dyn StorageBackend>,
        settings: Settings,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let (store, source) = WorkflowStore::open(backend.clone(), &settings.workflows_key).await;
        log_source("workflows", &source);

        let (executions, source) =
            ExecutionTracker::open(backend, &settings.executions_key).await;
        log_source("executions", &source);

        let workflows = WorkflowManager::new(store)
            .with_notifier(notifier)
            .with_policy(settings.policy);

        Self {
            settings,
            workflows,
            executions,
        }
    }

    /// Delete a workflow and then its execution history.
    ///
    /// Returns `Ok(false)` when the workflow did not exist. If the history
    /// cleanup fails the workflow stays deleted and the error is returned.
    pub async fn delete_workflow(&mut self, id: &str) -> Result<bool, WorkflowError> {
        if !self.workflows.delete(id).await? {
            return Ok(false);
        }
        self.executions.remove_for_workflow(id).await?;
        Ok(true)
    }

    /// Fire workflow `id` at `at`: record the planned execution, then stamp
    /// the workflow's last run. If the stamp cannot be saved the recorded
    /// execution is withdrawn again.
    pub async fn run_workflow(
        &mut self,
        id: &str,
        context: &ExecutionContext,
        at: DateTime<Utc>,
    ) -> Result<WorkflowExecution, WorkflowError> {
        let workflow = self
            .workflows
            .get(id)
            .ok_or_else(|| WorkflowError::NotFound(format!("Workflow {}", id)))?;
        let execution = plan_execution(workflow, context, at)?;
        self.executions.record(execution.clone()).await?;

        if let Err(e) = self.workflows.mark_run(id, at).await {
            if let Err(undo) = self.executions.remove(&execution.id).await {
                warn!("Could not withdraw execution {}: {}", execution.id, undo);
            }
            return Err(e);
        }
        Ok(execution)
    }
}

fn log_source(what: &str, source: &LoadSource) {
    match source {
        LoadSource::Persisted => info!("Loaded {} from storage", what),
        LoadSource::SeedMissing => info!("No stored {}, starting from sample data", what),
        LoadSource::SeedCorrupt { reason } | LoadSource::SeedUnreadable { reason } => {
            warn!("Stored {} unusable ({}), starting from sample data", what, reason)
        }
    }
}
