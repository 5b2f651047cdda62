//! Workflow list filtering

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::workflow::{Workflow, WorkflowStatus};

/// Search text plus status set. The default filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkflowFilters {
    /// Case-insensitive substring of name or description
    pub search_query: String,

    /// Statuses to keep; empty means no status filtering
    pub selected_statuses: BTreeSet<WorkflowStatus>,
}

impl WorkflowFilters {
    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search_query = query.into();
        self
    }

    pub fn with_status(mut self, status: WorkflowStatus) -> Self {
        self.selected_statuses.insert(status);
        self
    }

    /// Add `status` if absent, remove it otherwise
    pub fn toggle_status(&mut self, status: WorkflowStatus) {
        if !self.selected_statuses.remove(&status) {
            self.selected_statuses.insert(status);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when the filter keeps every workflow
    pub fn is_empty(&self) -> bool {
        self.search_query.trim().is_empty() && self.selected_statuses.is_empty()
    }

    /// Whether `workflow` passes both predicates
    pub fn matches(&self, workflow: &Workflow) -> bool {
        self.matches_search(workflow) && self.matches_status(workflow)
    }

    fn matches_search(&self, workflow: &Workflow) -> bool {
        // whitespace-only behaves as no query; otherwise the query is matched as typed
        if self.search_query.trim().is_empty() {
            return true;
        }
        let query = self.search_query.to_lowercase();
        workflow.name.to_lowercase().contains(&query)
            || workflow.description.to_lowercase().contains(&query)
    }

    fn matches_status(&self, workflow: &Workflow) -> bool {
        self.selected_statuses.is_empty() || self.selected_statuses.contains(&workflow.status)
    }
}

/// Workflows passing `filters`, in collection order
pub fn filter_workflows(workflows: &[Workflow], filters: &WorkflowFilters) -> Vec<Workflow> {
    workflows
        .iter()
        .filter(|w| filters.matches(w))
        .cloned()
        .collect()
}

/// Number of workflows per status; every status is present, possibly with 0
pub fn status_counts(workflows: &[Workflow]) -> BTreeMap<WorkflowStatus, usize> {
    let mut counts: BTreeMap<_, _> = WorkflowStatus::ALL.iter().map(|s| (*s, 0)).collect();
    for workflow in workflows {
        *counts.entry(workflow.status).or_insert(0) += 1;
    }
    counts
}
