//! Configuration module
//!
//! Configuration is read from the process environment (after loading `.env` through
//! dotenvy). Every variable goes through a lookup function so that tests can supply
//! values without mutating the environment of the test process.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_ANALYSIS_ENDPOINT, DEFAULT_BUCKET, DEFAULT_MAX_UPLOAD_SIZE_MB, DOWNLOAD_URL_TTL,
    SHARE_URL_TTL,
};
use crate::storage_types::StorageBackend;

const DEFAULT_LOCAL_STORAGE_PATH: &str = "./filedesk-data";
const DEFAULT_LOCAL_STORAGE_BASE_URL: &str = "http://localhost:3000/files";

/// Supabase project settings.
#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    /// Session JWT of the signed-in user. Requests fall back to the anon key without it.
    pub access_token: Option<String>,
}

/// Local filesystem backend settings.
#[derive(Clone, Debug)]
pub struct LocalStorageConfig {
    pub path: PathBuf,
    pub base_url: String,
    pub signing_secret: Option<String>,
    /// Identity used when there is no auth backend to ask.
    pub identity: Option<String>,
}

/// Document analysis endpoint settings.
#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    pub endpoint: String,
    /// `None` keeps the HTTP client's default behavior.
    pub timeout: Option<Duration>,
}

impl AnalysisConfig {
    pub fn uses_default_endpoint(&self) -> bool {
        self.endpoint == DEFAULT_ANALYSIS_ENDPOINT
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub storage_backend: StorageBackend,
    pub bucket: String,
    pub supabase: Option<SupabaseConfig>,
    pub local: LocalStorageConfig,
    pub analysis: AnalysisConfig,
    pub download_url_ttl: Duration,
    pub share_url_ttl: Duration,
    pub max_upload_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            storage_backend: StorageBackend::Local,
            bucket: DEFAULT_BUCKET.to_string(),
            supabase: None,
            local: LocalStorageConfig {
                path: PathBuf::from(DEFAULT_LOCAL_STORAGE_PATH),
                base_url: DEFAULT_LOCAL_STORAGE_BASE_URL.to_string(),
                signing_secret: None,
                identity: None,
            },
            analysis: AnalysisConfig {
                endpoint: DEFAULT_ANALYSIS_ENDPOINT.to_string(),
                timeout: None,
            },
            download_url_ttl: DOWNLOAD_URL_TTL,
            share_url_ttl: SHARE_URL_TTL,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_SIZE_MB * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load `.env` (if present) and read configuration from the environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through `lookup`, which returns the value of a variable if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let supabase = match var("SUPABASE_URL") {
            Some(url) => Some(SupabaseConfig {
                url: url.trim_end_matches('/').to_string(),
                anon_key: var("SUPABASE_ANON_KEY").ok_or_else(|| {
                    anyhow::anyhow!("SUPABASE_ANON_KEY must be set when SUPABASE_URL is set")
                })?,
                access_token: var("SUPABASE_ACCESS_TOKEN"),
            }),
            None => None,
        };

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(s) => s.parse()?,
            None if supabase.is_some() => StorageBackend::Supabase,
            None => StorageBackend::Local,
        };

        let local = LocalStorageConfig {
            path: var("LOCAL_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCAL_STORAGE_PATH)),
            base_url: var("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_LOCAL_STORAGE_BASE_URL.to_string()),
            signing_secret: var("LOCAL_SIGNING_SECRET"),
            identity: var("FILEDESK_IDENTITY"),
        };

        let analysis = AnalysisConfig {
            endpoint: var("ANALYSIS_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_ANALYSIS_ENDPOINT.to_string()),
            timeout: var("ANALYSIS_TIMEOUT_SECS")
                .map(|s| {
                    s.parse::<u64>()
                        .map(Duration::from_secs)
                        .map_err(|_| anyhow::anyhow!("ANALYSIS_TIMEOUT_SECS must be a valid number"))
                })
                .transpose()?,
        };

        let download_url_ttl = parse_secs(var("DOWNLOAD_URL_TTL_SECS"), DOWNLOAD_URL_TTL)
            .map_err(|_| anyhow::anyhow!("DOWNLOAD_URL_TTL_SECS must be a valid number"))?;
        let share_url_ttl = parse_secs(var("SHARE_URL_TTL_SECS"), SHARE_URL_TTL)
            .map_err(|_| anyhow::anyhow!("SHARE_URL_TTL_SECS must be a valid number"))?;

        let max_upload_size_mb = var("MAX_UPLOAD_SIZE_MB")
            .map(|s| {
                s.trim()
                    .parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be a valid number"))
            })
            .transpose()?
            .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE_MB);
        let max_upload_bytes = max_upload_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB is too large"))?;

        Ok(Config {
            environment,
            storage_backend,
            bucket: var("STORAGE_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            supabase,
            local,
            analysis,
            download_url_ttl,
            share_url_ttl,
            max_upload_bytes,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Upload size limit rounded down to whole megabytes, for display.
    pub fn max_upload_size_mb(&self) -> u64 {
        self.max_upload_bytes / (1024 * 1024)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.share_url_ttl <= self.download_url_ttl {
            return Err(anyhow::anyhow!(
                "SHARE_URL_TTL_SECS ({}) must be greater than DOWNLOAD_URL_TTL_SECS ({})",
                self.share_url_ttl.as_secs(),
                self.download_url_ttl.as_secs()
            ));
        }

        if self.download_url_ttl.is_zero() {
            return Err(anyhow::anyhow!("DOWNLOAD_URL_TTL_SECS must be greater than zero"));
        }

        if self.bucket.contains('/') {
            return Err(anyhow::anyhow!("STORAGE_BUCKET must not contain '/'"));
        }

        match self.storage_backend {
            StorageBackend::Supabase => {
                if self.supabase.is_none() {
                    return Err(anyhow::anyhow!(
                        "SUPABASE_URL and SUPABASE_ANON_KEY must be set for the supabase backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local.signing_secret.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_SIGNING_SECRET must be set for the local backend"
                    ));
                }
            }
        }

        if self.is_production() && self.analysis.uses_default_endpoint() {
            return Err(anyhow::anyhow!(
                "ANALYSIS_ENDPOINT must be set explicitly in production"
            ));
        }

        Ok(())
    }
}

fn parse_secs(value: Option<String>, default: Duration) -> Result<Duration, std::num::ParseIntError> {
    match value {
        Some(s) => s.trim().parse::<u64>().map(Duration::from_secs),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_variables() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Local);
        assert_eq!(config.bucket, "avatars");
        assert_eq!(config.download_url_ttl, Duration::from_secs(60));
        assert_eq!(config.share_url_ttl, Duration::from_secs(86_400));
        assert_eq!(config.max_upload_size_mb(), 50);
        assert!(config.analysis.uses_default_endpoint());
        assert!(config.analysis.timeout.is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn supabase_url_selects_supabase_backend() {
        let config = config_from(&[
            ("SUPABASE_URL", "https://project.supabase.co/"),
            ("SUPABASE_ANON_KEY", "anon"),
        ])
        .unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Supabase);
        let supabase = config.supabase.unwrap();
        assert_eq!(supabase.url, "https://project.supabase.co");
        assert!(supabase.access_token.is_none());
    }

    #[test]
    fn supabase_url_without_key_is_rejected() {
        let err = config_from(&[("SUPABASE_URL", "https://project.supabase.co")]).unwrap_err();
        assert!(err.to_string().contains("SUPABASE_ANON_KEY"));
    }

    #[test]
    fn explicit_backend_overrides_detection() {
        let config = config_from(&[
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("STORAGE_BACKEND", "local"),
        ])
        .unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Local);
    }

    #[test]
    fn invalid_ttl_is_an_error() {
        let err = config_from(&[("SHARE_URL_TTL_SECS", "a day")]).unwrap_err();
        assert!(err.to_string().contains("SHARE_URL_TTL_SECS"));
    }

    #[test]
    fn upload_limit_must_be_a_sane_number() {
        let config = config_from(&[("MAX_UPLOAD_SIZE_MB", "10")]).unwrap();
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);

        let err = config_from(&[("MAX_UPLOAD_SIZE_MB", "ten")]).unwrap_err();
        assert!(err.to_string().contains("MAX_UPLOAD_SIZE_MB"));

        let err = config_from(&[("MAX_UPLOAD_SIZE_MB", "18446744073709551615")]).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn validate_requires_share_ttl_above_download_ttl() {
        let config = config_from(&[
            ("LOCAL_SIGNING_SECRET", "secret"),
            ("DOWNLOAD_URL_TTL_SECS", "600"),
            ("SHARE_URL_TTL_SECS", "600"),
        ])
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_requires_signing_secret_for_local() {
        let config = config_from(&[]).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("LOCAL_SIGNING_SECRET"));

        let config = config_from(&[("LOCAL_SIGNING_SECRET", "secret")]).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn production_requires_explicit_analysis_endpoint() {
        let config = config_from(&[
            ("ENVIRONMENT", "production"),
            ("LOCAL_SIGNING_SECRET", "secret"),
        ])
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ANALYSIS_ENDPOINT"));

        let config = config_from(&[
            ("ENVIRONMENT", "prod"),
            ("LOCAL_SIGNING_SECRET", "secret"),
            ("ANALYSIS_ENDPOINT", "https://analysis.internal/query"),
        ])
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config_from(&[("STORAGE_BUCKET", "  "), ("ANALYSIS_TIMEOUT_SECS", "30")])
            .unwrap();
        assert_eq!(config.bucket, "avatars");
        assert_eq!(config.analysis.timeout, Some(Duration::from_secs(30)));
    }
}
