use crate::keys::{encode_key_path, validate_key};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filedesk_core::models::{SignedUrl, StoredFile, UploadFile};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Page size of the list call. Larger folders are truncated.
const LIST_LIMIT: u32 = 1000;

/// Supabase Storage implementation over the REST API
#[derive(Clone)]
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    bucket: String,
    api_key: String,
    access_token: Option<String>,
}

impl std::fmt::Debug for SupabaseStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseStorage")
            .field("base_url", &self.base_url)
            .field("bucket", &self.bucket)
            .finish()
    }
}

/// One entry of the list response.
#[derive(Debug, Deserialize)]
struct ObjectEntry {
    name: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    metadata: Option<ObjectMetadata>,
}

#[derive(Debug, Deserialize)]
struct ObjectMetadata {
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    mimetype: Option<String>,
}

impl From<ObjectEntry> for StoredFile {
    fn from(entry: ObjectEntry) -> Self {
        let (size, content_type) = entry
            .metadata
            .map(|m| (m.size, m.mimetype))
            .unwrap_or((None, None));
        StoredFile {
            name: entry.name,
            id: entry.id,
            size,
            content_type,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

/// Error body returned by the storage API.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, rename = "statusCode")]
    status_code: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl SupabaseStorage {
    /// Create a new SupabaseStorage instance
    ///
    /// # Arguments
    /// * `base_url` - Project URL (e.g., "https://xyzcompany.supabase.co")
    /// * `bucket` - Bucket name
    /// * `api_key` - Project anon key, sent as `apikey`
    /// * `access_token` - User session JWT; the anon key is used as bearer without it
    pub fn new(
        base_url: String,
        bucket: String,
        api_key: String,
        access_token: Option<String>,
    ) -> StorageResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket,
            api_key,
            access_token,
        })
    }

    fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1{}", self.base_url, path)
    }

    fn object_url(&self, storage_key: &str) -> String {
        self.storage_url(&format!(
            "/object/{}/{}",
            self.bucket,
            encode_key_path(storage_key)
        ))
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        request
            .header("apikey", self.api_key.as_str())
            .header("Authorization", format!("Bearer {}", bearer))
    }

    async fn send(&self, request: RequestBuilder) -> StorageResult<Response> {
        self.apply_auth(request)
            .send()
            .await
            .map_err(|e| StorageError::BackendError(format!("Request failed: {}", e)))
    }

    /// Turn a non-success response into the matching storage error.
    async fn error_from(
        response: Response,
        storage_key: &str,
        wrap: fn(String) -> StorageError,
    ) -> StorageError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();

        let not_found = status == StatusCode::NOT_FOUND
            || body.status_code.as_deref() == Some("404")
            || body.error.as_deref() == Some("not_found");
        if not_found {
            return StorageError::NotFound(storage_key.to_string());
        }

        let message = body
            .message
            .or(body.error)
            .unwrap_or_else(|| if text.is_empty() { status.to_string() } else { text });
        wrap(format!("{} ({})", message, status))
    }
}

#[async_trait]
impl Storage for SupabaseStorage {
    async fn list(&self, prefix: &str) -> StorageResult<Vec<StoredFile>> {
        validate_key(prefix)?;
        let start = std::time::Instant::now();

        let body = json!({
            "prefix": prefix,
            "limit": LIST_LIMIT,
            "offset": 0,
            "sortBy": { "column": "name", "order": "asc" },
        });
        let url = self.storage_url(&format!("/object/list/{}", self.bucket));
        let response = self.send(self.client.post(&url).json(&body)).await?;

        if !response.status().is_success() {
            let err = Self::error_from(response, prefix, StorageError::ListFailed).await;
            tracing::error!(error = %err, bucket = %self.bucket, prefix = %prefix, "Supabase list failed");
            return Err(err);
        }

        let entries: Vec<ObjectEntry> = response
            .json()
            .await
            .map_err(|e| StorageError::ListFailed(format!("Invalid list response: {}", e)))?;

        tracing::debug!(
            bucket = %self.bucket,
            prefix = %prefix,
            count = entries.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Supabase list successful"
        );

        Ok(entries.into_iter().map(StoredFile::from).collect())
    }

    async fn upload(&self, storage_key: &str, file: &UploadFile) -> StorageResult<()> {
        validate_key(storage_key)?;
        let start = std::time::Instant::now();

        let request = self
            .client
            .post(self.object_url(storage_key))
            .header("Content-Type", file.content_type.as_str())
            .header("cache-control", "max-age=3600")
            .header("x-upsert", "true")
            .body(file.data.clone());
        let response = self.send(request).await?;

        if !response.status().is_success() {
            let err = Self::error_from(response, storage_key, StorageError::UploadFailed).await;
            tracing::error!(error = %err, bucket = %self.bucket, key = %storage_key, "Supabase upload failed");
            return Err(err);
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = file.size(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Supabase upload successful"
        );

        Ok(())
    }

    async fn create_signed_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<SignedUrl> {
        validate_key(storage_key)?;

        let url = self.storage_url(&format!(
            "/object/sign/{}/{}",
            self.bucket,
            encode_key_path(storage_key)
        ));
        let body = json!({ "expiresIn": expires_in.as_secs() });
        let response = self.send(self.client.post(&url).json(&body)).await?;

        if !response.status().is_success() {
            let err = Self::error_from(response, storage_key, StorageError::SignFailed).await;
            tracing::error!(error = %err, bucket = %self.bucket, key = %storage_key, "Supabase sign failed");
            return Err(err);
        }

        let signed: SignResponse = response
            .json()
            .await
            .map_err(|e| StorageError::SignFailed(format!("Invalid sign response: {}", e)))?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %storage_key,
            expires_in_secs = expires_in.as_secs(),
            "Supabase signed URL created"
        );

        Ok(SignedUrl::new(
            self.storage_url(&signed.signed_url),
            expires_in,
        ))
    }

    async fn remove(&self, storage_keys: &[String]) -> StorageResult<()> {
        for key in storage_keys {
            validate_key(key)?;
        }

        let url = self.storage_url(&format!("/object/{}", self.bucket));
        let body = json!({ "prefixes": storage_keys });
        let response = self.send(self.client.delete(&url).json(&body)).await?;

        if !response.status().is_success() {
            let joined = storage_keys.join(", ");
            let err = Self::error_from(response, &joined, StorageError::DeleteFailed).await;
            // Deleting something already gone is success.
            if matches!(err, StorageError::NotFound(_)) {
                return Ok(());
            }
            tracing::error!(error = %err, bucket = %self.bucket, keys = %joined, "Supabase delete failed");
            return Err(err);
        }

        tracing::info!(
            bucket = %self.bucket,
            count = storage_keys.len(),
            "Supabase delete successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Supabase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn storage(server: &mockito::ServerGuard, token: Option<&str>) -> SupabaseStorage {
        SupabaseStorage::new(
            server.url(),
            "avatars".to_string(),
            "anon-key".to_string(),
            token.map(String::from),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_list_sends_prefix_and_maps_metadata() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/storage/v1/object/list/avatars")
            .match_header("apikey", "anon-key")
            .match_header("authorization", "Bearer user-jwt")
            .match_body(Matcher::PartialJson(json!({ "prefix": "U1", "offset": 0 })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"name":"doc.pdf","id":"obj-1","updated_at":"2024-05-01T10:00:00Z",
                     "created_at":"2024-05-01T10:00:00Z","last_accessed_at":null,
                     "metadata":{"size":1024,"mimetype":"application/pdf"}},
                    {"name":"notes.txt","id":null,"metadata":null}]"#,
            )
            .create_async()
            .await;

        let files = storage(&server, Some("user-jwt")).list("U1").await.unwrap();

        mock.assert_async().await;
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "doc.pdf");
        assert_eq!(files[0].size, Some(1024));
        assert_eq!(files[0].content_type.as_deref(), Some("application/pdf"));
        assert_eq!(files[1].name, "notes.txt");
        assert!(files[1].size.is_none());
    }

    #[tokio::test]
    async fn test_list_error_is_list_failed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/storage/v1/object/list/avatars")
            .with_status(400)
            .with_body(r#"{"statusCode":"400","error":"invalid","message":"Bucket not found"}"#)
            .create_async()
            .await;

        let err = storage(&server, None).list("U1").await.unwrap_err();
        match err {
            StorageError::ListFailed(msg) => assert!(msg.contains("Bucket not found")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_upserts_with_content_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/storage/v1/object/avatars/U1/my%20doc.pdf")
            .match_header("x-upsert", "true")
            .match_header("content-type", "application/pdf")
            .match_header("authorization", "Bearer anon-key")
            .match_body("%PDF-1.7")
            .with_status(200)
            .with_body(r#"{"Key":"avatars/U1/my doc.pdf"}"#)
            .create_async()
            .await;

        let file = UploadFile::from_bytes("my doc.pdf", b"%PDF-1.7".to_vec());
        storage(&server, None)
            .upload("U1/my doc.pdf", &file)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_signed_url_is_resolved_against_storage_root() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/storage/v1/object/sign/avatars/U1/doc.pdf")
            .match_body(Matcher::Json(json!({ "expiresIn": 86400 })))
            .with_status(200)
            .with_body(r#"{"signedURL":"/object/sign/avatars/U1/doc.pdf?token=abc"}"#)
            .create_async()
            .await;

        let signed = storage(&server, None)
            .create_signed_url("U1/doc.pdf", Duration::from_secs(86_400))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            signed.url,
            format!(
                "{}/storage/v1/object/sign/avatars/U1/doc.pdf?token=abc",
                server.url()
            )
        );
        assert_eq!(signed.expires_in, Duration::from_secs(86_400));
    }

    #[tokio::test]
    async fn test_sign_missing_object_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/storage/v1/object/sign/avatars/U1/gone.pdf")
            .with_status(400)
            .with_body(r#"{"statusCode":"404","error":"not_found","message":"Object not found"}"#)
            .create_async()
            .await;

        let err = storage(&server, None)
            .create_signed_url("U1/gone.pdf", Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_sends_prefixes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/storage/v1/object/avatars")
            .match_body(Matcher::Json(json!({ "prefixes": ["U1/doc.pdf"] })))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        storage(&server, None)
            .remove(&["U1/doc.pdf".to_string()])
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_remove_failure_is_delete_failed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/storage/v1/object/avatars")
            .with_status(403)
            .with_body(r#"{"statusCode":"403","error":"Unauthorized","message":"new row violates row-level security policy"}"#)
            .create_async()
            .await;

        let err = storage(&server, None)
            .remove(&["U1/doc.pdf".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::DeleteFailed(_)));
    }

    #[tokio::test]
    async fn test_invalid_key_never_reaches_backend() {
        let server = mockito::Server::new_async().await;
        let err = storage(&server, None)
            .create_signed_url("../U2/doc.pdf", Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
