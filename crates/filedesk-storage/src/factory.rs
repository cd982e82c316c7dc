#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-supabase")]
use crate::SupabaseStorage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use filedesk_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        #[cfg(feature = "storage-supabase")]
        StorageBackend::Supabase => {
            let supabase = config.supabase.as_ref().ok_or_else(|| {
                StorageError::ConfigError(
                    "SUPABASE_URL and SUPABASE_ANON_KEY not configured".to_string(),
                )
            })?;

            let storage = SupabaseStorage::new(
                supabase.url.clone(),
                config.bucket.clone(),
                supabase.anon_key.clone(),
                supabase.access_token.clone(),
            )?;
            tracing::info!(bucket = %config.bucket, "Using Supabase storage backend");
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-supabase"))]
        StorageBackend::Supabase => Err(StorageError::ConfigError(
            "Supabase storage backend not available (storage-supabase feature not enabled)"
                .to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let secret = config.local.signing_secret.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_SIGNING_SECRET not configured".to_string())
            })?;

            // Objects live under {root}/{bucket}/{identity}/{name}.
            let root = config.local.path.join(&config.bucket);
            let storage = LocalStorage::new(root, config.local.base_url.clone(), secret).await?;
            tracing::info!(path = %config.local.path.display(), "Using local storage backend");
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn creates_local_backend_under_bucket_directory() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.local.path = dir.path().to_path_buf();
        config.local.signing_secret = Some("secret".to_string());

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
        assert!(dir.path().join("avatars").is_dir());
    }

    #[tokio::test]
    async fn local_backend_requires_secret() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.local.path = dir.path().to_path_buf();

        let result = create_storage(&config).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }

    #[tokio::test]
    async fn supabase_backend_requires_settings() {
        let mut config = Config::default();
        config.storage_backend = StorageBackend::Supabase;
        let result = create_storage(&config).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
