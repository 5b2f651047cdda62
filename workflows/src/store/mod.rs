//! Workflow persistence

pub mod document;
pub mod seed;
pub mod workflow_store;

pub use document::LoadSource;
pub use workflow_store::WorkflowStore;
