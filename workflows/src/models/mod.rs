//! Data models

pub mod execution;
pub mod workflow;
