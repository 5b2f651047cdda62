//! Key/value storage backends
//!
//! The workflow store persists whole documents under a single key, the same
//! way the browser app keeps its collections in local storage. Two backends
//! are provided:
//!
//! - [`FileBackend`] keeps one JSON file per key under a directory and writes
//!   atomically (temp file + rename).
//! - [`MemoryBackend`] keeps values in memory and can be told to fail reads or
//!   writes, or to enforce a byte quota, which makes persistence failures easy
//!   to reproduce in tests.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::WorkflowError;
use crate::filesys::file::File;

/// Durable key/value storage
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read the value under `key`, `None` if it was never written
    async fn get(&self, key: &str) -> Result<Option<String>, WorkflowError>;

    /// Replace the value under `key`
    async fn set(&self, key: &str, value: &str) -> Result<(), WorkflowError>;

    /// Remove `key`; removing an absent key succeeds
    async fn remove(&self, key: &str) -> Result<(), WorkflowError>;
}

/// One `<key>.json` file per key
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_for(&self, key: &str) -> Result<File, WorkflowError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(WorkflowError::StorageError(format!(
                "Invalid storage key: {:?}",
                key
            )));
        }
        Ok(File::new(self.dir.join(format!("{}.json", key))))
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, WorkflowError> {
        let file = self.file_for(key)?;
        debug!("Reading {:?}", file.path());
        file.read_string().await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), WorkflowError> {
        let file = self.file_for(key)?;
        debug!("Writing {} bytes to {:?}", value.len(), file.path());
        file.write_atomic(value.as_bytes()).await
    }

    async fn remove(&self, key: &str) -> Result<(), WorkflowError> {
        self.file_for(key)?.delete().await
    }
}

/// Failure injection for [`MemoryBackend`]
#[derive(Debug, Clone, Default)]
pub struct MemoryBackendConfig {
    /// Reject every `set`/`remove`
    pub fail_writes: bool,

    /// Reject `set`/`remove` for these keys only
    pub failing_keys: HashSet<String>,

    /// Reject every `get`
    pub fail_reads: bool,

    /// Maximum total bytes across all keys
    pub quota_bytes: Option<usize>,
}

/// In-memory backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
    config: RwLock<MemoryBackendConfig>,
    writes: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MemoryBackendConfig) -> Self {
        Self {
            config: RwLock::new(config),
            ..Default::default()
        }
    }

    /// Seed a raw value without going through `set`
    pub fn insert_raw(&self, key: &str, value: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
    }

    /// Raw value under `key`, bypassing failure injection
    pub fn raw(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.config.write().unwrap_or_else(|e| e.into_inner()).fail_writes = fail;
    }

    pub fn set_fail_writes_for(&self, key: &str, fail: bool) {
        let mut config = self.config.write().unwrap_or_else(|e| e.into_inner());
        if fail {
            config.failing_keys.insert(key.to_string());
        } else {
            config.failing_keys.remove(key);
        }
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.config.write().unwrap_or_else(|e| e.into_inner()).fail_reads = fail;
    }

    pub fn set_quota(&self, quota_bytes: Option<usize>) {
        self.config.write().unwrap_or_else(|e| e.into_inner()).quota_bytes = quota_bytes;
    }

    /// Number of successful writes
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn config(&self) -> MemoryBackendConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn write_blocked(&self, key: &str) -> bool {
        let config = self.config.read().unwrap_or_else(|e| e.into_inner());
        config.fail_writes || config.failing_keys.contains(key)
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, WorkflowError> {
        if self.config().fail_reads {
            return Err(WorkflowError::StorageError(format!(
                "Simulated read failure for {}",
                key
            )));
        }
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), WorkflowError> {
        let config = self.config();
        if self.write_blocked(key) {
            return Err(WorkflowError::StorageError(format!(
                "Simulated write failure for {}",
                key
            )));
        }

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if let Some(quota) = config.quota_bytes {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let needed = others + value.len();
            if needed > quota {
                return Err(WorkflowError::QuotaExceeded { needed, quota });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), WorkflowError> {
        if self.write_blocked(key) {
            return Err(WorkflowError::StorageError(format!(
                "Simulated write failure for {}",
                key
            )));
        }
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}
