//! Shared HTTP client for the services filedesk calls besides storage.
//!
//! Provides a minimal client with configurable auth, generic GET/POST helpers that keep
//! transport failures apart from non-success statuses, and two domain clients: the
//! document analysis endpoint and the Supabase auth API.

pub mod analysis;
pub mod auth;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Errors from HTTP collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Failed to send request: {0}")]
    Transport(String),

    #[error("API request failed with status {status}: {}", detail_or(.reason, .detail))]
    Status {
        status: u16,
        reason: String,
        detail: Option<String>,
    },

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// The server-provided detail when present, otherwise the status reason phrase.
    pub fn detail_or_reason(&self) -> Option<&str> {
        match self {
            ApiError::Status { detail, reason, .. } => Some(detail_or(reason, detail)),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn detail_or<'a>(reason: &'a str, detail: &'a Option<String>) -> &'a str {
    detail.as_deref().unwrap_or(reason)
}

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// No credentials (the analysis endpoint is unauthenticated).
    None,
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// Supabase: `apikey: {api_key}` plus `Authorization: Bearer {access_token}`
    Supabase {
        api_key: String,
        access_token: String,
    },
}

/// HTTP client with configurable auth.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Auth,
}

impl ApiClient {
    /// `timeout` of `None` keeps reqwest's default (no overall timeout).
    pub fn new(base_url: String, auth: Auth, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::None => request,
            Auth::Bearer(token) => request.header("Authorization", format!("Bearer {}", token)),
            Auth::Supabase {
                api_key,
                access_token,
            } => request
                .header("apikey", api_key.as_str())
                .header("Authorization", format!("Bearer {}", access_token)),
        }
    }

    /// GET request. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.apply_auth(self.client.get(self.build_url(path)));
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Self::parse_json(response).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.apply_auth(self.client.post(self.build_url(path)).json(body));
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Self::parse_json(response).await
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<Value>(&text)
                .ok()
                .as_ref()
                .and_then(extract_detail);
            return Err(ApiError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
                detail,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Pull a human-readable message out of an error body.
///
/// `detail` wins (string as-is, structured values serialized); `msg`, `message`,
/// `error_description` and `error` are fallbacks used by the auth API.
pub fn extract_detail(body: &Value) -> Option<String> {
    ["detail", "msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| match body.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(Value::String(_)) => None,
            Some(other) => Some(other.to_string()),
        })
}

// Re-export domain clients for convenience.
pub use analysis::{AnalysisClient, DocumentAnalyzer};
pub use auth::{AuthClient, AuthUser, FactorSource};
