//! Execution record tracker
//!
//! Holds the history of workflow firings. Nothing here runs actions: records
//! are appended by whatever executes workflows and read back for reporting.
//! [`plan_execution`] only does the bookkeeping a dispatcher would need, laying
//! out a pending execution with each action's due date.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::WorkflowError;
use crate::models::execution::{ActionExecution, ActionStatus, ExecutionStatus, WorkflowExecution};
use crate::models::workflow::Workflow;
use crate::storage::backend::StorageBackend;
use crate::store::document::{self, LoadSource};
use crate::store::seed::sample_executions;
use crate::utils::generate_id;

/// Event a workflow is fired against
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    pub patient_id: Option<String>,
    pub appointment_id: Option<String>,

    /// Event payload the workflow's conditions are evaluated against
    pub data: Value,
}

/// Counts of executions by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionSummary {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Execution history mirrored to durable storage
pub struct ExecutionTracker {
    backend: Arc<dyn StorageBackend>,
    key: String,
    executions: Vec<WorkflowExecution>,
}

impl ExecutionTracker {
    pub fn new(backend: Arc<dyn StorageBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            executions: Vec::new(),
        }
    }

    pub async fn open(
        backend: Arc<dyn StorageBackend>,
        key: impl Into<String>,
    ) -> (Self, LoadSource) {
        let mut tracker = Self::new(backend, key);
        let source = tracker.load().await;
        (tracker, source)
    }

    pub async fn load(&mut self) -> LoadSource {
        let (executions, source) =
            document::read_or_seed(self.backend.as_ref(), &self.key, sample_executions).await;
        self.executions = executions;
        info!(
            "Loaded {} executions from '{}' ({:?})",
            self.executions.len(),
            self.key,
            source
        );
        source
    }

    async fn commit(&mut self, next: Vec<WorkflowExecution>) -> Result<(), WorkflowError> {
        document::write(self.backend.as_ref(), &self.key, &next).await?;
        self.executions = next;
        Ok(())
    }

    pub fn all(&self) -> &[WorkflowExecution] {
        &self.executions
    }

    pub fn get(&self, id: &str) -> Option<&WorkflowExecution> {
        self.executions.iter().find(|e| e.id == id)
    }

    /// Executions of one workflow, newest first
    pub fn for_workflow(&self, workflow_id: &str) -> Vec<&WorkflowExecution> {
        let mut found: Vec<_> = self
            .executions
            .iter()
            .filter(|e| e.workflow_id == workflow_id)
            .collect();
        found.sort_by(|a, b| b.triggered_at.cmp(&a.triggered_at));
        found
    }

    pub fn latest_for_workflow(&self, workflow_id: &str) -> Option<&WorkflowExecution> {
        self.executions
            .iter()
            .filter(|e| e.workflow_id == workflow_id)
            .max_by_key(|e| e.triggered_at)
    }

    pub fn with_status(&self, status: ExecutionStatus) -> Vec<&WorkflowExecution> {
        self.executions.iter().filter(|e| e.status == status).collect()
    }

    /// Executions whose workflow is not in `workflows` (deleted without cleanup)
    pub fn orphaned(&self, workflows: &[Workflow]) -> Vec<&WorkflowExecution> {
        self.executions
            .iter()
            .filter(|e| !workflows.iter().any(|w| w.id == e.workflow_id))
            .collect()
    }

    pub fn summary(&self) -> ExecutionSummary {
        self.executions
            .iter()
            .fold(ExecutionSummary::default(), |mut s, e| {
                s.total += 1;
                match e.status {
                    ExecutionStatus::Pending => s.pending += 1,
                    ExecutionStatus::InProgress => s.in_progress += 1,
                    ExecutionStatus::Completed => s.completed += 1,
                    ExecutionStatus::Failed => s.failed += 1,
                }
                s
            })
    }

    /// Append an execution record
    pub async fn record(&mut self, execution: WorkflowExecution) -> Result<(), WorkflowError> {
        if self.get(&execution.id).is_some() {
            return Err(WorkflowError::ValidationError(format!(
                "Execution {} already recorded",
                execution.id
            )));
        }
        let mut next = self.executions.clone();
        debug!("Recording execution {} of {}", execution.id, execution.workflow_id);
        next.push(execution);
        self.commit(next).await
    }

    /// Drop one execution; `Ok(false)` if it was not recorded
    pub async fn remove(&mut self, id: &str) -> Result<bool, WorkflowError> {
        if self.get(id).is_none() {
            return Ok(false);
        }
        let next: Vec<_> = self
            .executions
            .iter()
            .filter(|e| e.id != id)
            .cloned()
            .collect();
        self.commit(next).await?;
        debug!("Removed execution {}", id);
        Ok(true)
    }

    /// Drop every execution of `workflow_id`; returns how many were removed
    pub async fn remove_for_workflow(&mut self, workflow_id: &str) -> Result<usize, WorkflowError> {
        let next: Vec<_> = self
            .executions
            .iter()
            .filter(|e| e.workflow_id != workflow_id)
            .cloned()
            .collect();
        let removed = self.executions.len() - next.len();
        if removed > 0 {
            self.commit(next).await?;
            info!("Removed {} executions of workflow {}", removed, workflow_id);
        }
        Ok(removed)
    }
}

/// Lay out a pending execution of `workflow` for `context`.
///
/// Each action is due at `triggered_at` plus the delays of every step up to and
/// including it. Fails when the workflow is not active, its conditions do
/// not hold for `context.data`, or a due date falls outside the calendar.
pub fn plan_execution(
    workflow: &Workflow,
    context: &ExecutionContext,
    triggered_at: DateTime<Utc>,
) -> Result<WorkflowExecution, WorkflowError> {
    if !workflow.is_runnable() {
        return Err(WorkflowError::ValidationError(format!(
            "Workflow {} is {}, not active",
            workflow.id, workflow.status
        )));
    }
    if !workflow.conditions_met(&context.data) {
        return Err(WorkflowError::ValidationError(format!(
            "Conditions of workflow {} are not met",
            workflow.id
        )));
    }

    let mut due = triggered_at;
    let mut actions = Vec::with_capacity(workflow.steps.len());
    for step in &workflow.steps {
        let delay = step.delay_days.unwrap_or(0);
        due = Duration::try_days(i64::from(delay))
            .and_then(|d| due.checked_add_signed(d))
            .ok_or_else(|| {
                WorkflowError::ValidationError(format!(
                    "Step {} of workflow {} is scheduled out of range ({} days)",
                    step.id, workflow.id, delay
                ))
            })?;
        actions.push(ActionExecution {
            action_id: step.id.clone(),
            status: ActionStatus::Pending,
            scheduled_for: due,
            completed_at: None,
            result: None,
            error: None,
        });
    }

    Ok(WorkflowExecution {
        id: generate_id("exec"),
        workflow_id: workflow.id.clone(),
        patient_id: context.patient_id.clone(),
        appointment_id: context.appointment_id.clone(),
        triggered_at,
        completed_at: None,
        status: ExecutionStatus::Pending,
        actions,
    })
}
