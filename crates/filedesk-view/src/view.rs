//! File manager controller.
//!
//! Handlers take `&self` and may run concurrently. The state mutex is only held for short
//! synchronous updates, never across a backend call. Upload and analysis are each limited
//! to one in-flight run by an [`OperationGuard`]; the other operations race freely and
//! the last write to the state wins.

use crate::guard::OperationGuard;
use crate::platform::{Clipboard, UrlOpener};
use crate::state::ViewState;
use filedesk_api_client::DocumentAnalyzer;
use filedesk_core::constants::{
    COPIED_INDICATOR_DURATION, DEFAULT_MAX_UPLOAD_SIZE_MB, DOWNLOAD_URL_TTL, SHARE_URL_TTL,
};
use filedesk_core::models::{is_pdf, FileOperation, Identity, SignedUrl, StoredFile, UploadFile};
use filedesk_core::{AppError, Config, ErrorMetadata, LogLevel};
use filedesk_storage::keys::{identity_prefix, object_key};
use filedesk_storage::{Storage, StorageResult, StorageResultExt};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const ANALYSIS_SUCCESS: &str = "Document processed successfully";

/// Tunables taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOptions {
    pub download_url_ttl: Duration,
    pub share_url_ttl: Duration,
    pub max_upload_bytes: u64,
    pub copied_indicator: Duration,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            download_url_ttl: DOWNLOAD_URL_TTL,
            share_url_ttl: SHARE_URL_TTL,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            copied_indicator: COPIED_INDICATOR_DURATION,
        }
    }
}

impl ViewOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            download_url_ttl: config.download_url_ttl,
            share_url_ttl: config.share_url_ttl,
            max_upload_bytes: config.max_upload_bytes,
            ..Self::default()
        }
    }

    pub fn max_upload_size_mb(&self) -> u64 {
        self.max_upload_bytes / (1024 * 1024)
    }
}

/// Single-identity file workspace: list, upload, download, share, delete and PDF
/// analysis over an injected [`Storage`] backend.
pub struct FileManagerView {
    state: Arc<Mutex<ViewState>>,
    identity: Mutex<Option<Identity>>,
    storage: Mutex<Option<Arc<dyn Storage>>>,
    analyzer: Arc<dyn DocumentAnalyzer>,
    clipboard: Arc<dyn Clipboard>,
    opener: Arc<dyn UrlOpener>,
    options: ViewOptions,
    upload_guard: OperationGuard,
    analysis_guard: OperationGuard,
    analysis_cancel: Mutex<Option<CancellationToken>>,
    copied_generation: Arc<AtomicU64>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl FileManagerView {
    pub fn new(
        analyzer: Arc<dyn DocumentAnalyzer>,
        clipboard: Arc<dyn Clipboard>,
        opener: Arc<dyn UrlOpener>,
        options: ViewOptions,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(ViewState::default())),
            identity: Mutex::new(None),
            storage: Mutex::new(None),
            analyzer,
            clipboard,
            opener,
            options,
            upload_guard: OperationGuard::new("upload"),
            analysis_guard: OperationGuard::new("analysis"),
            analysis_cancel: Mutex::new(None),
            copied_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    /// Copy of the current state for rendering.
    pub fn snapshot(&self) -> ViewState {
        lock(&self.state).clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        lock(&self.identity).clone()
    }

    pub fn upload_hint(&self) -> String {
        lock(&self.state).upload_hint(self.options.max_upload_size_mb())
    }

    fn update<R>(&self, f: impl FnOnce(&mut ViewState) -> R) -> R {
        f(&mut lock(&self.state))
    }

    fn ready(&self) -> Result<(Identity, Arc<dyn Storage>), AppError> {
        let identity = lock(&self.identity).clone();
        let storage = lock(&self.storage).clone();
        match (identity, storage) {
            (Some(identity), Some(storage)) => Ok((identity, storage)),
            _ => Err(AppError::NotReady),
        }
    }

    /// Log at the error's level and show its message when it is user-facing.
    fn report(&self, action: &'static str, err: &AppError) {
        let code = err.error_code();
        match err.log_level() {
            LogLevel::Debug => tracing::debug!(action, code, error = %err, "Action skipped"),
            LogLevel::Warn => tracing::warn!(action, code, error = %err, "Action rejected"),
            LogLevel::Error => tracing::error!(action, code, error = ?err, "Action failed"),
        }
        if err.is_surfaced() {
            let message = err.client_message();
            self.update(|s| s.error = Some(message));
        }
    }

    // ----- lifecycle -----

    /// Obtain the storage client from `connect` and load the file list once an
    /// identity is also known.
    pub async fn mount<F, Fut>(&self, identity: Option<Identity>, connect: F) -> Result<(), AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StorageResult<Arc<dyn Storage>>>,
    {
        *lock(&self.identity) = identity;
        match connect().await {
            Ok(storage) => self.set_storage(storage).await,
            Err(e) => {
                let err = e.into_app_error(FileOperation::List);
                self.update(|s| s.loading = false);
                self.report("mount", &err);
                Err(err)
            }
        }
    }

    pub async fn set_identity(&self, identity: Option<Identity>) -> Result<(), AppError> {
        *lock(&self.identity) = identity;
        self.refresh_if_ready().await
    }

    pub async fn set_storage(&self, storage: Arc<dyn Storage>) -> Result<(), AppError> {
        *lock(&self.storage) = Some(storage);
        self.refresh_if_ready().await
    }

    async fn refresh_if_ready(&self) -> Result<(), AppError> {
        if self.ready().is_ok() {
            self.refresh().await
        } else {
            Ok(())
        }
    }

    // ----- list -----

    /// Replace the file list with everything under the identity's prefix.
    ///
    /// On failure the list is emptied and `Error loading files` is shown.
    pub async fn refresh(&self) -> Result<(), AppError> {
        let (identity, storage) = self.ready()?;
        self.update(|s| s.loading = true);

        let start = Instant::now();
        let result = list_files(&identity, storage.as_ref())
            .await
            .for_operation(FileOperation::List);

        match result {
            Ok(files) => {
                tracing::debug!(
                    identity_id = %identity.id,
                    count = files.len(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Files listed"
                );
                self.update(|s| {
                    s.files = files;
                    s.loading = false;
                });
                Ok(())
            }
            Err(err) => {
                self.update(|s| {
                    s.files.clear();
                    s.loading = false;
                });
                self.report("list", &err);
                Err(err)
            }
        }
    }

    // ----- upload -----

    /// Store `file` as `{identity}/{name}`, replacing any object of the same name.
    pub async fn upload(&self, file: UploadFile) -> Result<(), AppError> {
        let (identity, storage) = self.ready()?;
        let _permit = self
            .upload_guard
            .try_acquire()
            .inspect_err(|e| tracing::debug!(error = %e, "Upload rejected"))?;

        if let Err(err) = self.check_upload(&file) {
            self.report("upload", &err);
            return Err(err);
        }

        self.update(|s| {
            s.clear_error();
            s.uploading = true;
        });

        let start = Instant::now();
        let result = store_file(&identity, storage.as_ref(), &file).await;

        let outcome = match result {
            Ok(()) => {
                tracing::info!(
                    identity_id = %identity.id,
                    file_name = %file.name,
                    size = file.size(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "File uploaded"
                );
                // A failed refresh reports itself; the upload still succeeded.
                let _ = self.refresh().await;
                self.update(|s| s.success = FileOperation::Upload.success_message().map(String::from));
                Ok(())
            }
            Err(err) => {
                self.report("upload", &err);
                Err(err)
            }
        };

        self.update(|s| s.uploading = false);
        outcome
    }

    fn check_upload(&self, file: &UploadFile) -> Result<(), AppError> {
        file.validate_name()?;
        if file.size() > self.options.max_upload_bytes {
            return Err(AppError::FileTooLarge {
                size: file.size(),
                limit: self.options.max_upload_bytes,
            });
        }
        Ok(())
    }

    // ----- download / share -----

    /// Sign a short-lived URL for `name` and open it.
    pub async fn download(&self, name: &str) -> Result<(), AppError> {
        let (identity, storage) = self.ready()?;
        self.update(|s| s.clear_error());

        let result = sign(
            &identity,
            storage.as_ref(),
            name,
            self.options.download_url_ttl,
        )
        .await
        .for_operation(FileOperation::Download)
        .and_then(|link| self.opener.open(&link.url));

        if let Err(err) = &result {
            self.report("download", err);
        }
        result
    }

    /// Sign a long-lived link for `name` and open the share dialog with it.
    pub async fn share(&self, name: &str) -> Result<SignedUrl, AppError> {
        let (identity, storage) = self.ready()?;
        self.update(|s| s.clear_error());

        let result = sign(&identity, storage.as_ref(), name, self.options.share_url_ttl)
            .await
            .for_operation(FileOperation::Share);

        match result {
            Ok(link) => {
                tracing::info!(
                    identity_id = %identity.id,
                    file_name = %name,
                    expires_at = %link.expires_at(),
                    "Share link created"
                );
                let stored = link.clone();
                self.update(|s| {
                    s.share_url = Some(stored);
                    s.selected_file = Some(name.to_string());
                });
                Ok(link)
            }
            Err(err) => {
                self.report("share", &err);
                Err(err)
            }
        }
    }

    pub fn close_share_dialog(&self) {
        self.update(|s| {
            s.share_url = None;
            s.selected_file = None;
        });
    }

    // ----- clipboard -----

    pub async fn copy_share_link(&self) -> Result<(), AppError> {
        let url = self.update(|s| s.share_url.as_ref().map(|link| link.url.clone()));
        match url {
            Some(url) => self.copy_to_clipboard(&url).await,
            None => {
                let err = AppError::InvalidInput("No share link to copy".to_string());
                self.report("copy", &err);
                Err(err)
            }
        }
    }

    /// Write `text` to the clipboard and show the copied indicator for a short while.
    ///
    /// Each copy restarts the window; a timer from an earlier copy never hides the
    /// indicator of a later one.
    pub async fn copy_to_clipboard(&self, text: &str) -> Result<(), AppError> {
        if let Err(err) = self.clipboard.write_text(text) {
            self.report("copy", &err);
            return Err(err);
        }

        let generation = self.copied_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.update(|s| s.show_copied = true);

        let state = Arc::clone(&self.state);
        let current = Arc::clone(&self.copied_generation);
        let delay = self.options.copied_indicator;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if current.load(Ordering::SeqCst) == generation {
                lock(&state).show_copied = false;
            }
        });
        Ok(())
    }

    // ----- delete -----

    pub fn request_delete(&self, name: &str) {
        self.update(|s| {
            s.file_to_delete = Some(name.to_string());
            s.show_delete_dialog = true;
        });
    }

    pub fn cancel_delete(&self) {
        self.update(|s| {
            s.file_to_delete = None;
            s.show_delete_dialog = false;
        });
    }

    /// Delete the file pending confirmation. The dialog closes whatever the outcome.
    pub async fn confirm_delete(&self) -> Result<(), AppError> {
        let pending = self.update(|s| s.file_to_delete.clone());
        let result = match pending {
            Some(name) => self.delete_file(&name).await,
            None => Ok(()),
        };
        self.cancel_delete();
        result
    }

    async fn delete_file(&self, name: &str) -> Result<(), AppError> {
        let (identity, storage) = self.ready()?;
        self.update(|s| s.clear_error());

        let result = remove_file(&identity, storage.as_ref(), name)
            .await
            .for_operation(FileOperation::Delete);

        match result {
            Ok(()) => {
                tracing::info!(identity_id = %identity.id, file_name = %name, "File deleted");
                let _ = self.refresh().await;
                self.update(|s| s.success = FileOperation::Delete.success_message().map(String::from));
                Ok(())
            }
            Err(err) => {
                self.report("delete", &err);
                Err(err)
            }
        }
    }

    // ----- analysis -----

    pub fn can_analyze(&self, file: &StoredFile) -> bool {
        file.is_pdf()
    }

    /// True while an analysis of `name` is running.
    pub fn analysis_in_progress_for(&self, name: &str) -> bool {
        let state = lock(&self.state);
        state.processing_analysis && state.selected_file.as_deref() == Some(name)
    }

    /// Submit the PDF `name` to the analysis endpoint through a short-lived signed URL.
    ///
    /// Returns the analysis text, which is also shown in the analysis dialog.
    pub async fn analyze(&self, name: &str) -> Result<String, AppError> {
        let (identity, storage) = self.ready()?;
        let _permit = self
            .analysis_guard
            .try_acquire()
            .inspect_err(|e| tracing::debug!(error = %e, "Analysis rejected"))?;

        if !is_pdf(name) {
            let err = AppError::InvalidInput(format!("Only PDF files can be analyzed: {}", name));
            self.report("analyze", &err);
            return Err(err);
        }

        let token = CancellationToken::new();
        *lock(&self.analysis_cancel) = Some(token.clone());
        self.update(|s| {
            s.processing_analysis = true;
            s.clear_error();
            s.selected_file = Some(name.to_string());
        });

        let start = Instant::now();
        let result = tokio::select! {
            _ = token.cancelled() => Err(AppError::Cancelled("analysis")),
            r = self.run_analysis(&identity, storage.as_ref(), name) => r,
        };
        *lock(&self.analysis_cancel) = None;

        match &result {
            Ok(text) => {
                tracing::info!(
                    identity_id = %identity.id,
                    file_name = %name,
                    response_len = text.len(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Document analyzed"
                );
                let text = text.clone();
                self.update(|s| {
                    s.analysis_result = Some(text);
                    s.show_analysis_dialog = true;
                    s.success = Some(ANALYSIS_SUCCESS.to_string());
                });
            }
            Err(err) => self.report("analyze", err),
        }

        self.update(|s| s.processing_analysis = false);
        result
    }

    async fn run_analysis(
        &self,
        identity: &Identity,
        storage: &dyn Storage,
        name: &str,
    ) -> Result<String, AppError> {
        let link = sign(identity, storage, name, self.options.download_url_ttl)
            .await
            .map_err(|e| AppError::AnalysisTransport(e.to_string()))?;
        self.analyzer
            .analyze(&link.url)
            .await
            .map_err(|e| e.into_analysis_error())
    }

    /// Abort the running analysis. Returns false when none is running.
    pub fn cancel_analysis(&self) -> bool {
        match lock(&self.analysis_cancel).as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn close_analysis_dialog(&self) {
        self.update(|s| s.show_analysis_dialog = false);
    }

    // ----- drag and drop -----

    pub fn drag_enter(&self) {
        self.update(|s| s.is_dragging = true);
    }

    pub fn drag_over(&self) {}

    pub fn drag_leave(&self) {
        self.update(|s| s.is_dragging = false);
    }

    /// Upload the first dropped file; the rest are ignored.
    pub async fn drop(&self, files: Vec<UploadFile>) -> Result<(), AppError> {
        self.update(|s| s.is_dragging = false);
        match files.into_iter().next() {
            Some(file) => self.upload(file).await,
            None => Ok(()),
        }
    }
}

async fn list_files(identity: &Identity, storage: &dyn Storage) -> StorageResult<Vec<StoredFile>> {
    let prefix = identity_prefix(&identity.id)?;
    storage.list(&prefix).await
}

async fn store_file(
    identity: &Identity,
    storage: &dyn Storage,
    file: &UploadFile,
) -> Result<(), AppError> {
    let key = object_key(&identity.id, &file.name).for_operation(FileOperation::Upload)?;
    storage
        .upload(&key, file)
        .await
        .for_operation(FileOperation::Upload)
}

async fn sign(
    identity: &Identity,
    storage: &dyn Storage,
    name: &str,
    ttl: Duration,
) -> StorageResult<SignedUrl> {
    let key = object_key(&identity.id, name)?;
    storage.create_signed_url(&key, ttl).await
}

async fn remove_file(identity: &Identity, storage: &dyn Storage, name: &str) -> StorageResult<()> {
    let key = object_key(&identity.id, name)?;
    tracing::debug!(key = %key, "Removing object");
    storage.remove(&[key]).await
}
