//! Settings file management

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::WorkflowError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Storage key for the workflow collection
pub const DEFAULT_WORKFLOWS_KEY: &str = "workflows";

/// Storage key for execution records
pub const DEFAULT_EXECUTIONS_KEY: &str = "workflow_executions";

/// Workflow core settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON log lines
    #[serde(default)]
    pub json_logs: bool,

    /// Also write a rolling log file under `logs/`
    #[serde(default)]
    pub log_to_file: bool,

    /// Storage key holding the workflow array
    #[serde(default = "default_workflows_key")]
    pub workflows_key: String,

    /// Storage key holding execution records
    #[serde(default = "default_executions_key")]
    pub executions_key: String,

    /// Mutation rules
    #[serde(default)]
    pub policy: MutationPolicy,
}

fn default_workflows_key() -> String {
    DEFAULT_WORKFLOWS_KEY.to_string()
}

fn default_executions_key() -> String {
    DEFAULT_EXECUTIONS_KEY.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            json_logs: false,
            log_to_file: false,
            workflows_key: default_workflows_key(),
            executions_key: default_executions_key(),
            policy: MutationPolicy::default(),
        }
    }
}

/// Validation applied by mutation operations.
///
/// Both checks are off by default, which accepts whatever the UI sends:
/// blank names become "Untitled Workflow" and any status may follow any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationPolicy {
    /// Reject status changes outside the workflow lifecycle
    #[serde(default)]
    pub enforce_transitions: bool,

    /// Reject blank names instead of defaulting them
    #[serde(default)]
    pub reject_blank_names: bool,
}

impl MutationPolicy {
    pub fn strict() -> Self {
        Self {
            enforce_transitions: true,
            reject_blank_names: true,
        }
    }
}

impl Settings {
    /// Load settings from `file`, falling back to defaults when it does not exist
    pub async fn load(file: &File) -> Result<Self, WorkflowError> {
        match file.read_json::<Settings>().await {
            Ok(Some(settings)) => Ok(settings),
            Ok(None) => {
                info!("No settings file at {:?}, using defaults", file.path());
                Ok(Settings::default())
            }
            Err(e) => Err(WorkflowError::ConfigError(format!(
                "Unable to read settings file {:?}: {}",
                file.path(),
                e
            ))),
        }
    }

    pub async fn save(&self, file: &File) -> Result<(), WorkflowError> {
        file.write_json(self).await
    }
}
