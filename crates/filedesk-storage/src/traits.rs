//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use filedesk_core::models::{FileOperation, SignedUrl, StoredFile, UploadFile};
use filedesk_core::AppError;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("Signing failed: {0}")]
    SignFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Invalid signed URL token")]
    InvalidSignature,

    #[error("Signed URL has expired")]
    Expired,

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Convert into the view-level error for the operation that failed.
    pub fn into_app_error(self, operation: FileOperation) -> AppError {
        AppError::Storage {
            operation,
            message: self.to_string(),
        }
    }
}

/// Attach the failing operation when crossing from the storage layer into the view.
pub trait StorageResultExt<T> {
    fn for_operation(self, operation: FileOperation) -> Result<T, AppError>;
}

impl<T> StorageResultExt<T> for StorageResult<T> {
    fn for_operation(self, operation: FileOperation) -> Result<T, AppError> {
        self.map_err(|e| e.into_app_error(operation))
    }
}

/// Storage abstraction trait
///
/// Both backends (Supabase, local filesystem) implement this trait so the view never
/// couples to a specific provider.
///
/// **Key format:** keys are identity-scoped, `{identity_id}/{file_name}`. See the crate
/// root documentation and [`crate::keys`].
#[async_trait]
pub trait Storage: Send + Sync {
    /// List every object directly under `prefix`.
    ///
    /// Names in the result are relative to the prefix. The whole set is returned in one
    /// call; there is no pagination.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<StoredFile>>;

    /// Store `file` at `storage_key`, replacing any existing object with that key.
    async fn upload(&self, storage_key: &str, file: &UploadFile) -> StorageResult<()>;

    /// Generate a URL granting read access to `storage_key` for `expires_in`.
    async fn create_signed_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<SignedUrl>;

    /// Delete the objects at `storage_keys`. Missing objects are not an error.
    async fn remove(&self, storage_keys: &[String]) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_operation_maps_into_storage_variant() {
        let result: StorageResult<()> = Err(StorageError::NotFound("u1/a.txt".to_string()));
        match result.for_operation(FileOperation::Download) {
            Err(AppError::Storage { operation, message }) => {
                assert_eq!(operation, FileOperation::Download);
                assert!(message.contains("u1/a.txt"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
