//! Supabase auth API client: the current user and their registered MFA factors.

use crate::{ApiClient, ApiError, Auth};
use async_trait::async_trait;
use filedesk_core::models::{Factor, Identity};
use filedesk_core::AppError;
use serde::Deserialize;

const USER_PATH: &str = "/auth/v1/user";

/// The authenticated user as returned by `GET /auth/v1/user`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    // The API sends `null` for users without factors.
    #[serde(default)]
    factors: Option<Vec<Factor>>,
}

impl AuthUser {
    pub fn factors(&self) -> &[Factor] {
        self.factors.as_deref().unwrap_or_default()
    }

    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            email: self.email.clone(),
        }
    }
}

/// Lists the MFA factors registered for the current user.
#[async_trait]
pub trait FactorSource: Send + Sync {
    async fn list_factors(&self) -> Result<Vec<Factor>, ApiError>;
}

#[derive(Clone, Debug)]
pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    pub fn new(
        supabase_url: String,
        api_key: String,
        access_token: String,
    ) -> Result<Self, ApiError> {
        let api = ApiClient::new(
            supabase_url,
            Auth::Supabase {
                api_key,
                access_token,
            },
            None,
        )?;
        Ok(Self { api })
    }

    pub async fn current_user(&self) -> Result<AuthUser, ApiError> {
        let user: AuthUser = self.api.get(USER_PATH).await?;
        tracing::debug!(
            user_id = %user.id,
            factor_count = user.factors().len(),
            "Fetched current user"
        );
        Ok(user)
    }
}

#[async_trait]
impl FactorSource for AuthClient {
    async fn list_factors(&self) -> Result<Vec<Factor>, ApiError> {
        Ok(self.current_user().await?.factors.unwrap_or_default())
    }
}

impl ApiError {
    /// Map a failed auth request onto the error the view surfaces.
    pub fn into_auth_error(self) -> AppError {
        match self {
            ApiError::Status { detail, .. } => AppError::Auth(detail.unwrap_or_default()),
            ApiError::Transport(msg) | ApiError::Decode(msg) | ApiError::Config(msg) => {
                tracing::debug!(error = %msg, "Auth request failed");
                AppError::Auth(String::new())
            }
        }
    }
}
