//! Workflow mutation operations
//!
//! Every mutation follows the same shape: derive the next collection from the
//! current one, commit it through the store, and only then expose it. A failed
//! write leaves the in-memory collection exactly as it was, and the failure is
//! reported to the notification sink as well as returned to the caller.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::errors::WorkflowError;
use crate::filter::{filter_workflows, status_counts, WorkflowFilters};
use crate::models::workflow::{
    NewWorkflow, Workflow, WorkflowPatch, WorkflowStatus, DEFAULT_WORKFLOW_NAME,
};
use crate::notify::{
    workflow_route, Navigator, NoopNavigator, Notification, NotificationSink, TracingNotifier,
    WORKFLOWS_ROUTE,
};
use crate::storage::settings::MutationPolicy;
use crate::store::{LoadSource, WorkflowStore};
use crate::utils::{generate_id, next_timestamp, Clock, SystemClock};

/// Suffix appended to the name of a duplicated workflow
pub const COPY_SUFFIX: &str = " (Copy)";

/// Owns the workflow store and applies mutations to it
pub struct WorkflowManager {
    store: WorkflowStore,
    filters: WorkflowFilters,
    notifier: Arc<dyn NotificationSink>,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
    policy: MutationPolicy,
    viewing: Option<String>,
}

impl WorkflowManager {
    /// Wrap a loaded store, logging notifications and ignoring navigation
    pub fn new(store: WorkflowStore) -> Self {
        Self {
            store,
            filters: WorkflowFilters::default(),
            notifier: Arc::new(TracingNotifier),
            navigator: Arc::new(NoopNavigator),
            clock: Arc::new(SystemClock),
            policy: MutationPolicy::default(),
            viewing: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: MutationPolicy) -> Self {
        self.policy = policy;
        self
    }

    // ---- reads ----

    pub fn workflows(&self) -> &[Workflow] {
        self.store.workflows()
    }

    pub fn get(&self, id: &str) -> Option<&Workflow> {
        self.store.get(id)
    }

    pub fn store(&self) -> &WorkflowStore {
        &self.store
    }

    pub fn policy(&self) -> MutationPolicy {
        self.policy
    }

    /// Re-read the collection from storage
    pub async fn reload(&mut self) -> LoadSource {
        self.store.load().await
    }

    pub fn filters(&self) -> &WorkflowFilters {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut WorkflowFilters {
        &mut self.filters
    }

    pub fn set_filters(&mut self, filters: WorkflowFilters) {
        self.filters = filters;
    }

    /// The current collection through the current filters
    pub fn filtered(&self) -> Vec<Workflow> {
        filter_workflows(self.store.workflows(), &self.filters)
    }

    pub fn status_counts(&self) -> BTreeMap<WorkflowStatus, usize> {
        status_counts(self.store.workflows())
    }

    /// Id of the workflow whose detail view is open
    pub fn viewing(&self) -> Option<&str> {
        self.viewing.as_deref()
    }

    // ---- navigation ----

    /// Open a workflow's detail view
    pub fn view(&mut self, id: &str) -> Result<&Workflow, WorkflowError> {
        if !self.store.contains(id) {
            let err = WorkflowError::NotFound(format!("Workflow {}", id));
            self.notifier
                .notify(Notification::failure("Workflow not found", err.to_string()));
            return Err(err);
        }
        self.viewing = Some(id.to_string());
        self.navigator.navigate(&workflow_route(id));
        self.store
            .get(id)
            .ok_or_else(|| WorkflowError::NotFound(format!("Workflow {}", id)))
    }

    /// Leave the detail view for the list
    pub fn close_view(&mut self) {
        if self.viewing.take().is_some() {
            self.navigator.navigate(WORKFLOWS_ROUTE);
        }
    }

    // ---- mutations ----

    /// Create a workflow, defaulting every missing field
    pub async fn create(&mut self, data: NewWorkflow) -> Result<Workflow, WorkflowError> {
        let result = self.try_create(data).await;
        self.report(result, "Error creating workflow", |wf| {
            Notification::success("Workflow created", format!("\"{}\" has been created.", wf.name))
        })
    }

    async fn try_create(&mut self, data: NewWorkflow) -> Result<Workflow, WorkflowError> {
        if self.policy.reject_blank_names && is_blank(data.name.as_deref()) {
            return Err(WorkflowError::ValidationError(
                "Workflow name is required".to_string(),
            ));
        }

        let id = self.fresh_id();
        let workflow = data.into_workflow(id, self.clock.now());

        let mut next = self.store.workflows().to_vec();
        next.push(workflow.clone());
        self.store.commit(next).await?;

        info!("Created workflow {} ({})", workflow.id, workflow.name);
        Ok(workflow)
    }

    /// Merge `patch` over an existing workflow
    pub async fn update(
        &mut self,
        id: &str,
        patch: WorkflowPatch,
    ) -> Result<Workflow, WorkflowError> {
        let result = self.try_update(id, patch).await;
        self.report(result, "Error updating workflow", |wf| {
            Notification::success("Workflow updated", format!("\"{}\" has been saved.", wf.name))
        })
    }

    async fn try_update(
        &mut self,
        id: &str,
        mut patch: WorkflowPatch,
    ) -> Result<Workflow, WorkflowError> {
        let index = self.index_of(id)?;
        let current = &self.store.workflows()[index];

        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                if self.policy.reject_blank_names {
                    return Err(WorkflowError::ValidationError(
                        "Workflow name is required".to_string(),
                    ));
                }
                patch.name = Some(DEFAULT_WORKFLOW_NAME.to_string());
            }
        }

        if let Some(status) = patch.status {
            if self.policy.enforce_transitions && !current.status.can_transition_to(status) {
                return Err(WorkflowError::ValidationError(format!(
                    "Cannot change workflow {} from {} to {}",
                    id, current.status, status
                )));
            }
        }

        let mut next = self.store.workflows().to_vec();
        let workflow = &mut next[index];
        patch.apply_to(workflow);
        workflow.updated_at = next_timestamp(self.clock.now(), workflow.updated_at);
        let updated = workflow.clone();

        self.store.commit(next).await?;
        debug!("Updated workflow {}", id);
        Ok(updated)
    }

    /// Change only the status of a workflow
    pub async fn set_status(
        &mut self,
        id: &str,
        status: WorkflowStatus,
    ) -> Result<Workflow, WorkflowError> {
        let result = self.try_update(id, WorkflowPatch::status(status)).await;
        self.report(result, "Error updating workflow status", |wf| {
            let title = match status {
                WorkflowStatus::Active => "Workflow activated",
                WorkflowStatus::Paused => "Workflow paused",
                WorkflowStatus::Inactive => "Workflow deactivated",
                WorkflowStatus::Draft => "Workflow moved to draft",
            };
            Notification::success(title, format!("\"{}\" is now {}.", wf.name, status))
        })
    }

    pub async fn activate(&mut self, id: &str) -> Result<Workflow, WorkflowError> {
        self.set_status(id, WorkflowStatus::Active).await
    }

    pub async fn pause(&mut self, id: &str) -> Result<Workflow, WorkflowError> {
        self.set_status(id, WorkflowStatus::Paused).await
    }

    pub async fn deactivate(&mut self, id: &str) -> Result<Workflow, WorkflowError> {
        self.set_status(id, WorkflowStatus::Inactive).await
    }

    /// Record that a workflow fired at `at`
    pub async fn mark_run(
        &mut self,
        id: &str,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<Workflow, WorkflowError> {
        let patch = WorkflowPatch {
            last_run: Some(at),
            ..Default::default()
        };
        let result = self.try_update(id, patch).await;
        self.report_failure(result, "Error recording workflow run")
    }

    /// Remove a workflow.
    ///
    /// Returns `Ok(false)` without touching storage when the id is unknown, so
    /// deleting twice is harmless. Execution records are left to the caller.
    pub async fn delete(&mut self, id: &str) -> Result<bool, WorkflowError> {
        let Some(name) = self.store.get(id).map(|w| w.name.clone()) else {
            warn!("Delete requested for unknown workflow {}", id);
            return Ok(false);
        };

        let next: Vec<Workflow> = self
            .store
            .workflows()
            .iter()
            .filter(|w| w.id != id)
            .cloned()
            .collect();
        let result = self.store.commit(next).await;
        self.report(result, "Error deleting workflow", |_| {
            Notification::success("Workflow deleted", format!("\"{}\" has been deleted.", name))
        })?;

        info!("Deleted workflow {}", id);
        if self.viewing.as_deref() == Some(id) {
            self.viewing = None;
            self.navigator.navigate(WORKFLOWS_ROUTE);
        }
        Ok(true)
    }

    /// Copy a workflow as a new draft named "<name> (Copy)"
    pub async fn duplicate(&mut self, id: &str) -> Result<Workflow, WorkflowError> {
        let result = self.try_duplicate(id).await;
        self.report(result, "Error duplicating workflow", |wf| {
            Notification::success("Workflow duplicated", format!("\"{}\" has been created.", wf.name))
        })
    }

    async fn try_duplicate(&mut self, id: &str) -> Result<Workflow, WorkflowError> {
        let index = self.index_of(id)?;
        let now = self.clock.now();

        let mut copy = self.store.workflows()[index].clone();
        copy.id = self.fresh_id();
        copy.name = format!("{}{}", copy.name, COPY_SUFFIX);
        copy.status = WorkflowStatus::Draft;
        copy.last_run = None;
        copy.created_at = now;
        copy.updated_at = now;

        let mut next = self.store.workflows().to_vec();
        next.push(copy.clone());
        self.store.commit(next).await?;

        info!("Duplicated workflow {} as {}", id, copy.id);
        Ok(copy)
    }

    // ---- helpers ----

    fn index_of(&self, id: &str) -> Result<usize, WorkflowError> {
        self.store
            .workflows()
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(|| WorkflowError::NotFound(format!("Workflow {}", id)))
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = generate_id("wf");
            if !self.store.contains(&id) {
                return id;
            }
        }
    }

    fn report<T>(
        &self,
        result: Result<T, WorkflowError>,
        failure_title: &str,
        success: impl FnOnce(&T) -> Notification,
    ) -> Result<T, WorkflowError> {
        match &result {
            Ok(value) => self.notifier.notify(success(value)),
            Err(e) => {
                error!("{}: {}", failure_title, e);
                self.notifier
                    .notify(Notification::failure(failure_title, e.to_string()));
            }
        }
        result
    }

    fn report_failure<T>(
        &self,
        result: Result<T, WorkflowError>,
        failure_title: &str,
    ) -> Result<T, WorkflowError> {
        if let Err(e) = &result {
            error!("{}: {}", failure_title, e);
            self.notifier
                .notify(Notification::failure(failure_title, e.to_string()));
        }
        result
    }
}

fn is_blank(name: Option<&str>) -> bool {
    name.map_or(true, |n| n.trim().is_empty())
}
