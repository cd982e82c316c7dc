//! Document analysis endpoint client.
//!
//! One unauthenticated `POST {endpoint}` with `{"query": ...}`; the answer comes back as
//! `{"response": ...}`. No retries.

use crate::{ApiClient, ApiError, Auth};
use async_trait::async_trait;
use filedesk_core::constants::ANALYSIS_QUERY_PREFIX;
use filedesk_core::AppError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    response: String,
}

/// Submits a document for analysis and returns the analysis text.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, document_url: &str) -> Result<String, ApiError>;
}

/// Natural-language query embedding the document URL.
pub fn analysis_query(document_url: &str) -> String {
    format!("{}{}", ANALYSIS_QUERY_PREFIX, document_url)
}

/// Client for the analysis endpoint.
#[derive(Clone, Debug)]
pub struct AnalysisClient {
    api: ApiClient,
}

impl AnalysisClient {
    /// `endpoint` is the full URL requests are posted to.
    pub fn new(endpoint: String, timeout: Option<Duration>) -> Result<Self, ApiError> {
        Ok(Self {
            api: ApiClient::new(endpoint, Auth::None, timeout)?,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.api.base_url()
    }
}

#[async_trait]
impl DocumentAnalyzer for AnalysisClient {
    async fn analyze(&self, document_url: &str) -> Result<String, ApiError> {
        let query = analysis_query(document_url);
        let start = std::time::Instant::now();

        tracing::info!(endpoint = %self.endpoint(), "Sending document to analysis endpoint");

        let result: Result<QueryResponse, ApiError> =
            self.api.post_json("", &QueryRequest { query: &query }).await;

        match result {
            Ok(body) => {
                tracing::info!(
                    endpoint = %self.endpoint(),
                    response_len = body.response.len(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Analysis endpoint responded"
                );
                Ok(body.response)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    status = ?e.status(),
                    endpoint = %self.endpoint(),
                    "Analysis endpoint error"
                );
                Err(e)
            }
        }
    }
}

impl ApiError {
    /// Map a failed analysis request onto the error the view surfaces.
    pub fn into_analysis_error(self) -> AppError {
        match self {
            ApiError::Status {
                status,
                reason,
                detail,
            } => AppError::AnalysisStatus {
                status,
                detail: detail.unwrap_or(reason),
            },
            ApiError::Transport(msg) | ApiError::Decode(msg) => AppError::AnalysisTransport(msg),
            ApiError::Config(msg) => AppError::Internal(msg),
        }
    }
}
