use bytes::Bytes;
use std::path::Path;

use crate::error::AppError;

/// A file selected (or dropped) for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadFile {
    /// Build from in-memory bytes; the content type is derived from the name.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let content_type = content_type_for(&name);
        Self {
            name,
            content_type,
            data: data.into(),
        }
    }

    /// Read a local file. The stored name is the file name without directories.
    pub async fn from_path(path: &Path) -> Result<Self, AppError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                AppError::InvalidInput(format!("Not a file name: {}", path.display()))
            })?
            .to_string();
        let data = tokio::fs::read(path).await?;
        Ok(Self::from_bytes(name, data))
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Object names are a single path segment under the identity prefix.
    pub fn validate_name(&self) -> Result<(), AppError> {
        validate_object_name(&self.name)
    }
}

/// Reject names that would escape or restructure the identity namespace.
pub fn validate_object_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::InvalidInput("File name is empty".to_string()));
    }
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(AppError::InvalidInput(format!("Invalid file name: {}", name)));
    }
    Ok(())
}

/// Content type from the file extension; `application/octet-stream` when unknown.
pub fn content_type_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .to_string()
}
