//! Test doubles for the view's collaborators.

use async_trait::async_trait;
use filedesk_api_client::{ApiError, DocumentAnalyzer};
use filedesk_core::models::{SignedUrl, StoredFile, UploadFile};
use filedesk_core::AppError;
use filedesk_storage::{Storage, StorageBackend, StorageError, StorageResult};
use filedesk_view::{Clipboard, FileManagerView, MemoryClipboard, UrlOpener, ViewOptions};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// In-memory storage that records calls and can be told to fail or to block uploads.
#[derive(Default)]
pub struct MockStorage {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
    hold_uploads: Mutex<bool>,
    pub upload_started: Notify,
    pub release_upload: Notify,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_file(&self, key: &str, data: &[u8]) {
        self.files.lock().unwrap().insert(key.to_string(), data.to_vec());
    }

    pub fn has_file(&self, key: &str) -> bool {
        self.files.lock().unwrap().contains_key(key)
    }

    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    /// Uploads wait for `release_upload` after signalling `upload_started`.
    pub fn hold_uploads(&self) {
        *self.hold_uploads.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(':').next() == Some(operation))
            .count()
    }

    fn record(&self, operation: &'static str, arg: &str) -> StorageResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}", operation, arg));
        if self.failing.lock().unwrap().contains(operation) {
            return Err(StorageError::BackendError(format!("{} unavailable", operation)));
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn list(&self, prefix: &str) -> StorageResult<Vec<StoredFile>> {
        self.record("list", prefix)?;
        let scope = format!("{}/", prefix);
        Ok(self
            .files
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(key, data)| {
                key.strip_prefix(&scope).map(|name| StoredFile {
                    size: Some(data.len() as u64),
                    ..StoredFile::new(name)
                })
            })
            .collect())
    }

    async fn upload(&self, storage_key: &str, file: &UploadFile) -> StorageResult<()> {
        self.record("upload", storage_key)?;
        let hold = *self.hold_uploads.lock().unwrap();
        if hold {
            self.upload_started.notify_one();
            self.release_upload.notified().await;
        }
        self.set_file(storage_key, &file.data);
        Ok(())
    }

    async fn create_signed_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<SignedUrl> {
        self.record("sign", storage_key)?;
        if !self.has_file(storage_key) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }
        Ok(SignedUrl::new(
            format!(
                "https://storage.test/{}?expires_in={}",
                storage_key,
                expires_in.as_secs()
            ),
            expires_in,
        ))
    }

    async fn remove(&self, storage_keys: &[String]) -> StorageResult<()> {
        self.record("remove", &storage_keys.join(","))?;
        let mut files = self.files.lock().unwrap();
        for key in storage_keys {
            files.remove(key);
        }
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Analyzer returning a fixed answer, or waiting forever when `hang` is set.
pub struct StubAnalyzer {
    pub answer: String,
    pub hang: bool,
    pub started: Notify,
    pub urls: Mutex<Vec<String>>,
}

impl StubAnalyzer {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            hang: false,
            started: Notify::new(),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::answering("")
        }
    }
}

#[async_trait]
impl DocumentAnalyzer for StubAnalyzer {
    async fn analyze(&self, document_url: &str) -> Result<String, ApiError> {
        self.urls.lock().unwrap().push(document_url.to_string());
        self.started.notify_one();
        if self.hang {
            std::future::pending::<()>().await;
        }
        Ok(self.answer.clone())
    }
}

#[derive(Default)]
pub struct RecordingOpener {
    pub opened: Mutex<Vec<String>>,
}

impl UrlOpener for RecordingOpener {
    fn open(&self, url: &str) -> Result<(), AppError> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

pub struct DeniedClipboard;

impl Clipboard for DeniedClipboard {
    fn write_text(&self, _text: &str) -> Result<(), AppError> {
        Err(AppError::Clipboard("permission denied".to_string()))
    }
}

/// View wired to the given doubles, with default options.
pub struct Harness {
    pub view: Arc<FileManagerView>,
    pub storage: Arc<MockStorage>,
    pub analyzer: Arc<StubAnalyzer>,
    pub clipboard: Arc<MemoryClipboard>,
    pub opener: Arc<RecordingOpener>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_analyzer(StubAnalyzer::answering("Summary\nKey points"))
    }

    pub fn with_analyzer(analyzer: StubAnalyzer) -> Self {
        let storage = Arc::new(MockStorage::new());
        let analyzer = Arc::new(analyzer);
        let clipboard = Arc::new(MemoryClipboard::new());
        let opener = Arc::new(RecordingOpener::default());
        let view = Arc::new(FileManagerView::new(
            analyzer.clone(),
            clipboard.clone(),
            opener.clone(),
            ViewOptions::default(),
        ));
        Self {
            view,
            storage,
            analyzer,
            clipboard,
            opener,
        }
    }

    pub fn storage_handle(&self) -> Arc<dyn Storage> {
        self.storage.clone()
    }
}
