//! Desktop seams: clipboard writes and opening URLs in a new browsing context.

use filedesk_core::AppError;
use std::sync::Mutex;

pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), AppError>;
}

pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), AppError>;
}

/// System clipboard through `arboard`.
///
/// The handle is opened on first use and kept, since on Linux the selection is only
/// served while it is alive.
#[cfg(feature = "system-clipboard")]
#[derive(Default)]
pub struct SystemClipboard {
    inner: Mutex<Option<arboard::Clipboard>>,
}

#[cfg(feature = "system-clipboard")]
impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "system-clipboard")]
impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), AppError> {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if guard.is_none() {
            *guard =
                Some(arboard::Clipboard::new().map_err(|e| AppError::Clipboard(e.to_string()))?);
        }
        match guard.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text.to_string())
                .map_err(|e| AppError::Clipboard(e.to_string())),
            None => Err(AppError::Clipboard("clipboard unavailable".to_string())),
        }
    }
}

/// Process-local clipboard for headless runs.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), AppError> {
        *self
            .contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(text.to_string());
        Ok(())
    }
}

/// Hands URLs to the platform's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<(), AppError> {
        open::that_detached(url).map_err(|e| opener_error(url, e))
    }
}

fn opener_error(url: &str, err: std::io::Error) -> AppError {
    AppError::Opener(format!("{}: {}", url, err))
}

/// Writes the URL to stdout for the user to open.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintOpener;

impl UrlOpener for PrintOpener {
    fn open(&self, url: &str) -> Result<(), AppError> {
        println!("{}", url);
        Ok(())
    }
}
