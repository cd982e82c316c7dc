use filedesk_core::models::{display_name, SignedUrl, StoredFile};
use serde::Serialize;
use std::time::Duration;

/// Everything the file page renders from.
///
/// A fresh state starts in `loading`; messages are replaced per action and the share
/// dialog is open exactly while `share_url` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub files: Vec<StoredFile>,
    pub loading: bool,
    pub uploading: bool,
    pub processing_analysis: bool,
    pub is_dragging: bool,
    pub show_copied: bool,
    pub error: Option<String>,
    pub success: Option<String>,
    pub selected_file: Option<String>,
    pub share_url: Option<SignedUrl>,
    pub file_to_delete: Option<String>,
    pub show_delete_dialog: bool,
    pub analysis_result: Option<String>,
    pub show_analysis_dialog: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            loading: true,
            uploading: false,
            processing_analysis: false,
            is_dragging: false,
            show_copied: false,
            error: None,
            success: None,
            selected_file: None,
            share_url: None,
            file_to_delete: None,
            show_delete_dialog: false,
            analysis_result: None,
            show_analysis_dialog: false,
        }
    }
}

impl ViewState {
    pub fn share_dialog_open(&self) -> bool {
        self.share_url.is_some()
    }

    pub fn share_dialog_title(&self) -> Option<String> {
        if !self.share_dialog_open() {
            return None;
        }
        self.selected_file
            .as_deref()
            .map(|name| format!("Share {}", display_name(name)))
    }

    /// Notice under the share link, phrased from the link's validity window.
    pub fn share_expiry_notice(&self) -> Option<String> {
        self.share_url
            .as_ref()
            .map(|link| format!("This link will expire in {}", describe_ttl(link.expires_in)))
    }

    pub fn analysis_dialog_title(&self) -> Option<String> {
        if !self.show_analysis_dialog {
            return None;
        }
        self.selected_file
            .as_deref()
            .map(|name| format!("Analysis of {}", display_name(name)))
    }

    /// One paragraph per line of the analysis text.
    pub fn analysis_paragraphs(&self) -> Vec<&str> {
        self.analysis_result
            .as_deref()
            .map(|text| text.split('\n').collect())
            .unwrap_or_default()
    }

    /// Text on the upload drop zone.
    pub fn upload_hint(&self, max_upload_size_mb: u64) -> String {
        if self.uploading {
            "Uploading...".to_string()
        } else if self.is_dragging {
            "Drop your file here".to_string()
        } else {
            format!(
                "Drag and drop or click to select a file (max {}mb)",
                max_upload_size_mb
            )
        }
    }

    pub(crate) fn clear_error(&mut self) {
        self.error = None;
    }
}

fn describe_ttl(ttl: Duration) -> String {
    let secs = ttl.as_secs();
    match secs {
        s if s >= 3600 && s % 3600 == 0 => plural(s / 3600, "hour"),
        s if s >= 60 && s % 60 == 0 => plural(s / 60, "minute"),
        s => plural(s, "second"),
    }
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}
