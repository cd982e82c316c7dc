use std::fmt::{Display, Formatter, Result as FmtResult};

/// Storage-backed operations the file view performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileOperation {
    List,
    Upload,
    Download,
    Share,
    Delete,
}

impl FileOperation {
    /// Generic message shown when the operation fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            FileOperation::List => "Error loading files",
            FileOperation::Upload => "Failed to upload file",
            FileOperation::Download => "Failed to download file",
            FileOperation::Share => "Failed to generate share link",
            FileOperation::Delete => "Failed to delete file",
        }
    }

    /// Message shown on success, for operations that announce one.
    pub fn success_message(&self) -> Option<&'static str> {
        match self {
            FileOperation::Upload => Some("File uploaded successfully"),
            FileOperation::Delete => Some("File deleted successfully"),
            _ => None,
        }
    }
}

impl Display for FileOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FileOperation::List => write!(f, "list"),
            FileOperation::Upload => write!(f, "upload"),
            FileOperation::Download => write!(f, "download"),
            FileOperation::Share => write!(f, "share"),
            FileOperation::Delete => write!(f, "delete"),
        }
    }
}
