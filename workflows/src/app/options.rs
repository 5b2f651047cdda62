//! Command line options

use std::collections::HashMap;
use std::path::PathBuf;

use crate::errors::WorkflowError;
use crate::logs::LogLevel;
use crate::models::workflow::WorkflowStatus;
use crate::storage::layout::StorageLayout;

/// Parse `--key=value` and bare `--flag` arguments. Bare flags map to "true".
pub fn parse_args<I>(args: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = String>,
{
    let mut cli_args = HashMap::new();
    for arg in args {
        if let Some((key, value)) = arg.split_once('=') {
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }
    cli_args
}

/// Overrides taken from the command line
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Storage base directory
    pub data_dir: Option<PathBuf>,

    /// Log level, overriding the settings file
    pub log_level: Option<LogLevel>,
}

impl AppOptions {
    pub fn from_args(cli_args: &HashMap<String, String>) -> Result<Self, WorkflowError> {
        let log_level = cli_args
            .get("log-level")
            .map(|s| s.parse::<LogLevel>())
            .transpose()
            .map_err(WorkflowError::ConfigError)?;

        Ok(Self {
            data_dir: cli_args.get("data-dir").map(PathBuf::from),
            log_level,
        })
    }

    pub fn layout(&self) -> StorageLayout {
        match &self.data_dir {
            Some(dir) => StorageLayout::new(dir),
            None => StorageLayout::default(),
        }
    }
}

/// Parse a comma-separated status list such as `active,paused`
pub fn parse_statuses(value: &str) -> Result<Vec<WorkflowStatus>, WorkflowError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<WorkflowStatus>().map_err(WorkflowError::ValidationError))
        .collect()
}
