//! Error types module
//!
//! All failures the view surfaces are unified under [`AppError`]. Each variant describes
//! itself through [`ErrorMetadata`]: the user-facing message shown in the view, the level
//! it is logged at, and whether a new user action can reasonably succeed.

use crate::models::FileOperation;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected conditions like a missing identity
    Debug,
    /// Warning level - for rejected user input
    Warn,
    /// Error level - for backend failures
    Error,
}

/// Metadata for error presentation
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "STORAGE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether a new user-initiated attempt may succeed
    fn is_recoverable(&self) -> bool;

    /// Message shown to the user (may differ from the internal error message)
    fn client_message(&self) -> String;

    /// Whether this error is shown in the view at all
    fn is_surfaced(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Identity or storage client not available yet")]
    NotReady,

    #[error("Operation already in progress: {0}")]
    Busy(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("{operation} failed: {message}")]
    Storage {
        operation: FileOperation,
        message: String,
    },

    #[error("Analysis API error ({status}): {detail}")]
    AnalysisStatus { status: u16, detail: String },

    #[error("Analysis request failed: {0}")]
    AnalysisTransport(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(&'static str),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Failed to open URL: {0}")]
    Opener(String),

    #[error("Auth error: {0}")]
    Auth(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        match self {
            AppError::NotReady => "NOT_READY",
            AppError::Busy(_) => "BUSY",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::Storage { .. } => "STORAGE_ERROR",
            AppError::AnalysisStatus { .. } => "ANALYSIS_API_ERROR",
            AppError::AnalysisTransport(_) => "ANALYSIS_TRANSPORT_ERROR",
            AppError::Cancelled(_) => "CANCELLED",
            AppError::Clipboard(_) => "CLIPBOARD_ERROR",
            AppError::Opener(_) => "OPENER_ERROR",
            AppError::Auth(_) => "AUTH_ERROR",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "INTERNAL_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            AppError::InvalidInput(_) | AppError::FileTooLarge { .. }
        )
    }

    fn client_message(&self) -> String {
        match self {
            AppError::NotReady => String::new(),
            AppError::Busy(operation) => format!("Another {} is already in progress", operation),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::FileTooLarge { limit, .. } => format!(
                "File exceeds the {} MB upload limit",
                limit / (1024 * 1024)
            ),
            AppError::Storage { operation, .. } => operation.failure_message().to_string(),
            AppError::AnalysisStatus { status, detail } => {
                format!("Analysis API error ({}): {}", status, detail)
            }
            AppError::AnalysisTransport(msg) => {
                if msg.trim().is_empty() {
                    "Failed to process document".to_string()
                } else {
                    msg.clone()
                }
            }
            AppError::Cancelled(_) => "Document analysis cancelled".to_string(),
            AppError::Clipboard(_) => "Failed to copy to clipboard".to_string(),
            AppError::Opener(_) => FileOperation::Download.failure_message().to_string(),
            AppError::Auth(msg) => {
                if msg.trim().is_empty() {
                    "Failed to check MFA status".to_string()
                } else {
                    msg.clone()
                }
            }
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Something went wrong".to_string()
            }
        }
    }

    fn is_surfaced(&self) -> bool {
        !matches!(self, AppError::NotReady | AppError::Busy(_))
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AppError::NotReady | AppError::Busy(_) | AppError::Cancelled(_) => LogLevel::Debug,
            AppError::InvalidInput(_) | AppError::FileTooLarge { .. } => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}
