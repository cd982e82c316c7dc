use crate::keys::{encode_key_path, validate_key};
use crate::signing;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filedesk_core::models::{content_type_for, SignedUrl, StoredFile, UploadFile};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Signed URLs carry an HMAC token (see [`crate::signing`]); whatever serves
/// `base_url` resolves them through [`LocalStorage::open_signed`].
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    signing_secret: Vec<u8>,
}

impl std::fmt::Debug for LocalStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStorage")
            .field("base_path", &self.base_path)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/filedesk")
    /// * `base_url` - Base URL signed links point at (e.g., "http://localhost:3000/files")
    /// * `signing_secret` - HMAC key for signed URL tokens
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        signing_secret: impl Into<Vec<u8>>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();
        let signing_secret = signing_secret.into();

        if signing_secret.is_empty() {
            return Err(StorageError::ConfigError(
                "Signing secret must not be empty".to_string(),
            ));
        }

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
            signing_secret,
        })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Rejects keys with traversal sequences and keys that resolve outside the root.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;

        let path = self.base_path.join(storage_key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    fn signed_url_for(&self, storage_key: &str, token: &str) -> String {
        format!(
            "{}/{}?token={}",
            self.base_url.trim_end_matches('/'),
            encode_key_path(storage_key),
            token
        )
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Resolve a signed URL token and read the object it grants access to.
    pub async fn open_signed(&self, token: &str) -> StorageResult<Vec<u8>> {
        let storage_key = signing::verify(token, &self.signing_secret)?;
        let path = self.key_to_path(&storage_key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key));
        }

        let data = fs::read(&path).await?;
        tracing::debug!(key = %storage_key, size_bytes = data.len(), "Signed URL resolved");
        Ok(data)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn list(&self, prefix: &str) -> StorageResult<Vec<StoredFile>> {
        let dir = self.key_to_path(prefix)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&dir).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&dir).await.map_err(|e| {
            StorageError::ListFailed(format!("Failed to read {}: {}", dir.display(), e))
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(String::from) else {
                tracing::warn!(path = %entry.path().display(), "Skipping non UTF-8 file name");
                continue;
            };
            let updated_at = meta.modified().ok().map(DateTime::<Utc>::from);
            let created_at = meta.created().ok().map(DateTime::<Utc>::from);
            files.push(StoredFile {
                content_type: Some(content_type_for(&name)),
                size: Some(meta.len()),
                id: None,
                created_at: created_at.or(updated_at),
                updated_at,
                name,
            });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));

        tracing::debug!(
            prefix = %prefix,
            count = files.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage list successful"
        );

        Ok(files)
    }

    async fn upload(&self, storage_key: &str, file: &UploadFile) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut out = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        out.write_all(&file.data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        out.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = file.size(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn create_signed_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<SignedUrl> {
        let path = self.key_to_path(storage_key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        let token = signing::create(storage_key, expires_in, &self.signing_secret)?;
        Ok(SignedUrl::new(
            self.signed_url_for(storage_key, &token),
            expires_in,
        ))
    }

    async fn remove(&self, storage_keys: &[String]) -> StorageResult<()> {
        let start = std::time::Instant::now();

        for storage_key in storage_keys {
            let path = self.key_to_path(storage_key)?;

            if !fs::try_exists(&path).await.unwrap_or(false) {
                continue;
            }

            fs::remove_file(&path).await.map_err(|e| {
                StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                ))
            })?;
        }

        tracing::info!(
            count = storage_keys.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, "http://localhost:3000/files".to_string(), "secret")
            .await
            .unwrap()
    }

    fn token_of(url: &str) -> &str {
        url.split_once("?token=").unwrap().1
    }

    #[tokio::test]
    async fn test_local_storage_upload_list() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .upload("U1/doc.pdf", &UploadFile::from_bytes("doc.pdf", b"%PDF".to_vec()))
            .await
            .unwrap();
        storage
            .upload("U1/a.txt", &UploadFile::from_bytes("a.txt", b"text".to_vec()))
            .await
            .unwrap();

        let files = storage.list("U1").await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "doc.pdf"]);
        assert_eq!(files[1].size, Some(4));
        assert_eq!(files[1].content_type.as_deref(), Some("application/pdf"));
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_prefix() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .upload("U1/mine.txt", &UploadFile::from_bytes("mine.txt", b"1".to_vec()))
            .await
            .unwrap();
        storage
            .upload("U2/theirs.txt", &UploadFile::from_bytes("theirs.txt", b"2".to_vec()))
            .await
            .unwrap();

        let files = storage.list("U1").await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "mine.txt");
        assert!(storage.list("U3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_overwrites() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        for body in [b"first".to_vec(), b"second!".to_vec()] {
            storage
                .upload("U1/a.txt", &UploadFile::from_bytes("a.txt", body))
                .await
                .unwrap();
        }

        let files = storage.list("U1").await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].size, Some(7));
    }

    #[tokio::test]
    async fn test_signed_url_round_trip() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        storage
            .upload("U1/my doc.pdf", &UploadFile::from_bytes("my doc.pdf", b"%PDF".to_vec()))
            .await
            .unwrap();

        let signed = storage
            .create_signed_url("U1/my doc.pdf", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(signed
            .url
            .starts_with("http://localhost:3000/files/U1/my%20doc.pdf?token="));
        assert_eq!(signed.expires_in, Duration::from_secs(60));

        let data = storage.open_signed(token_of(&signed.url)).await.unwrap();
        assert_eq!(data, b"%PDF");
    }

    #[tokio::test]
    async fn test_signed_url_for_missing_object_fails() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let result = storage
            .create_signed_url("U1/missing.pdf", Duration::from_secs(60))
            .await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_signed_url_from_other_secret_is_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        storage
            .upload("U1/a.txt", &UploadFile::from_bytes("a.txt", b"x".to_vec()))
            .await
            .unwrap();

        let other = LocalStorage::new(dir.path(), "http://other".to_string(), "other-secret")
            .await
            .unwrap();
        let signed = other
            .create_signed_url("U1/a.txt", Duration::from_secs(60))
            .await
            .unwrap();

        let result = storage.open_signed(token_of(&signed.url)).await;
        assert!(matches!(result, Err(StorageError::InvalidSignature)));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.list("../../../etc").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.remove(&["../etc/passwd".to_string()]).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage
            .create_signed_url("/etc/passwd", Duration::from_secs(60))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_remove_nonexistent_is_ok() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .upload("U1/a.txt", &UploadFile::from_bytes("a.txt", b"x".to_vec()))
            .await
            .unwrap();
        storage
            .remove(&["U1/a.txt".to_string(), "U1/nonexistent.txt".to_string()])
            .await
            .unwrap();
        assert!(storage.list("U1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_secret_is_rejected() {
        let dir = tempdir().unwrap();
        let result = LocalStorage::new(dir.path(), "http://x".to_string(), "").await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
