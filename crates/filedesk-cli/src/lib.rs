//! Wiring shared by the `filedesk` binary: tracing, identity resolution, and building the
//! view from configuration.

use anyhow::Context;
use filedesk_api_client::{AnalysisClient, AuthClient};
use filedesk_core::models::{Identity, StoredFile};
use filedesk_core::{AppError, Config, ErrorMetadata, StorageBackend};
use filedesk_storage::create_storage;
use filedesk_view::{Clipboard, FileManagerView, UrlOpener, ViewOptions};
use std::sync::Arc;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Auth client for the configured Supabase project.
pub fn auth_client(config: &Config) -> anyhow::Result<AuthClient> {
    let supabase = config
        .supabase
        .as_ref()
        .context("SUPABASE_URL and SUPABASE_ANON_KEY must be set")?;
    let access_token = supabase
        .access_token
        .clone()
        .context("SUPABASE_ACCESS_TOKEN must be set to act as a signed-in user")?;
    AuthClient::new(supabase.url.clone(), supabase.anon_key.clone(), access_token)
        .context("Failed to create auth client")
}

/// The signed-in user for Supabase, or `FILEDESK_IDENTITY` for the local backend.
pub async fn resolve_identity(config: &Config) -> anyhow::Result<Identity> {
    match config.storage_backend {
        StorageBackend::Supabase => {
            let user = auth_client(config)?
                .current_user()
                .await
                .map_err(|e| into_cli_error(e.into_auth_error()))
                .context("Failed to fetch the current user")?;
            Ok(user.identity())
        }
        StorageBackend::Local => {
            let id = config
                .local
                .identity
                .clone()
                .context("FILEDESK_IDENTITY must be set for the local backend")?;
            Ok(Identity::new(id))
        }
    }
}

/// Build the view and mount it for `identity`, loading the file list.
pub async fn mount_view(
    config: &Config,
    identity: Identity,
    clipboard: Arc<dyn Clipboard>,
    opener: Arc<dyn UrlOpener>,
) -> anyhow::Result<FileManagerView> {
    let analyzer = AnalysisClient::new(config.analysis.endpoint.clone(), config.analysis.timeout)
        .context("Failed to create analysis client")?;
    let view = FileManagerView::new(
        Arc::new(analyzer),
        clipboard,
        opener,
        ViewOptions::from_config(config),
    );
    view.mount(Some(identity), || create_storage(config))
        .await
        .map_err(into_cli_error)?;
    Ok(view)
}

/// Turn a view error into a CLI error whose top-level message is the user-facing one.
pub fn into_cli_error(err: AppError) -> anyhow::Error {
    let message = err.client_message();
    if message.is_empty() {
        anyhow::Error::new(err)
    } else {
        anyhow::Error::new(err).context(message)
    }
}

/// One line of the `list --format table` output.
pub fn format_file_row(file: &StoredFile) -> String {
    let size = file
        .size
        .map(|s| format!("{:.2}", s as f64 / (1024.0 * 1024.0)))
        .unwrap_or_else(|| "-".to_string());
    let updated = file
        .updated_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<40} {:<28} {:>10} {:>20}",
        truncate_string(file.display_name(), 40),
        truncate_string(file.content_type.as_deref().unwrap_or("-"), 28),
        size,
        updated
    )
}
