//! Durable storage: backends, on-disk layout and settings

pub mod backend;
pub mod layout;
pub mod settings;
