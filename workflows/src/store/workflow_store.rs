//! Workflow store
//!
//! The single owner of the workflow collection. The in-memory list is only
//! replaced after the whole collection has been written under the storage
//! key, so a failed write leaves both copies as they were.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::WorkflowError;
use crate::models::workflow::Workflow;
use crate::storage::backend::StorageBackend;
use crate::store::document::{self, LoadSource};
use crate::store::seed::sample_workflows;

/// Authoritative workflow collection mirrored to durable storage
pub struct WorkflowStore {
    backend: Arc<dyn StorageBackend>,
    key: String,
    workflows: Vec<Workflow>,
}

impl WorkflowStore {
    /// Create an empty store; call [`WorkflowStore::load`] to populate it
    pub fn new(backend: Arc<dyn StorageBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            workflows: Vec::new(),
        }
    }

    /// Create a store and load it in one go
    pub async fn open(
        backend: Arc<dyn StorageBackend>,
        key: impl Into<String>,
    ) -> (Self, LoadSource) {
        let mut store = Self::new(backend, key);
        let source = store.load().await;
        (store, source)
    }

    /// Replace the in-memory collection with the persisted one, or the sample set
    pub async fn load(&mut self) -> LoadSource {
        let (workflows, source) =
            document::read_or_seed(self.backend.as_ref(), &self.key, sample_workflows).await;

        let mut workflows = dedupe_ids(workflows);
        for workflow in &mut workflows {
            let assigned = workflow.assign_step_ids();
            if assigned > 0 {
                debug!("Assigned ids to {} steps of workflow {}", assigned, workflow.id);
            }
        }
        self.workflows = workflows;
        info!(
            "Loaded {} workflows from '{}' ({:?})",
            self.workflows.len(),
            self.key,
            source
        );
        source
    }

    /// Persist `workflows` as the whole collection. Does not touch memory.
    pub async fn save(&self, workflows: &[Workflow]) -> Result<(), WorkflowError> {
        debug!("Saving {} workflows to '{}'", workflows.len(), self.key);
        document::write(self.backend.as_ref(), &self.key, workflows).await
    }

    /// Persist `next`, then make it the in-memory collection
    pub async fn commit(&mut self, next: Vec<Workflow>) -> Result<(), WorkflowError> {
        self.save(&next).await?;
        self.workflows = next;
        Ok(())
    }

    /// All workflows in insertion order
    pub fn workflows(&self) -> &[Workflow] {
        &self.workflows
    }

    /// Get a workflow by id
    pub fn get(&self, id: &str) -> Option<&Workflow> {
        self.workflows.iter().find(|w| w.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// All workflow ids
    pub fn ids(&self) -> Vec<String> {
        self.workflows.iter().map(|w| w.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }

    /// Storage key this store persists under
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Keep the first record for each id
fn dedupe_ids(workflows: Vec<Workflow>) -> Vec<Workflow> {
    let mut seen = HashSet::new();
    workflows
        .into_iter()
        .filter(|w| {
            let first = seen.insert(w.id.clone());
            if !first {
                warn!("Dropping duplicate workflow id '{}' from storage", w.id);
            }
            first
        })
        .collect()
}
