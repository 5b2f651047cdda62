//! Workflow execution records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One firing of a workflow against a patient/appointment context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecution {
    pub id: String,

    /// Workflow that fired; may point at a deleted workflow
    pub workflow_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,

    pub triggered_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    pub status: ExecutionStatus,

    #[serde(default)]
    pub actions: Vec<ActionExecution>,
}

impl WorkflowExecution {
    /// Actions that ended in failure
    pub fn failed_actions(&self) -> impl Iterator<Item = &ActionExecution> {
        self.actions
            .iter()
            .filter(|a| a.status == ActionStatus::Failed)
    }

    /// Next action still waiting to run, by schedule
    pub fn next_pending(&self) -> Option<&ActionExecution> {
        self.actions
            .iter()
            .filter(|a| a.status == ActionStatus::Pending)
            .min_by_key(|a| a.scheduled_for)
    }
}

/// Execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::InProgress => "in_progress",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Outcome of a single step within an execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionExecution {
    /// Step ID within the workflow
    pub action_id: String,

    pub status: ActionStatus,

    pub scheduled_for: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Action status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}
