//! Filedesk Core Library
//!
//! This crate provides the configuration, error taxonomy, and domain models that are
//! shared across all filedesk components.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
// Note: Storage, StorageError, StorageResult live in the filedesk-storage crate
