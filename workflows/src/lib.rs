//! CareCRM Workflows Library
//!
//! Workflow automation core for the CareCRM administrative app: the workflow
//! model, its durable store, list filtering, mutation operations and the
//! execution history.

pub mod app;
pub mod errors;
pub mod filesys;
pub mod filter;
pub mod logs;
pub mod manager;
pub mod models;
pub mod notify;
pub mod storage;
pub mod store;
pub mod tracker;
pub mod utils;

pub use errors::WorkflowError;
pub use filter::{filter_workflows, WorkflowFilters};
pub use manager::WorkflowManager;
pub use models::execution::WorkflowExecution;
pub use models::workflow::{NewWorkflow, Workflow, WorkflowPatch, WorkflowStatus};
pub use store::WorkflowStore;
pub use tracker::ExecutionTracker;
