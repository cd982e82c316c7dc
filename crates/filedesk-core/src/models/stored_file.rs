use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An object in the identity's namespace.
///
/// `name` is relative to the identity prefix as returned by the store's list call.
/// Metadata is whatever the backend reported; the view only relies on the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoredFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            size: None,
            content_type: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Last path segment of the name.
    pub fn display_name(&self) -> &str {
        display_name(&self.name)
    }

    pub fn is_pdf(&self) -> bool {
        is_pdf(&self.name)
    }
}

/// Last `/`-separated segment of `name`.
pub fn display_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// True when `name` ends in `.pdf`, ignoring case.
pub fn is_pdf(name: &str) -> bool {
    name.to_lowercase().ends_with(".pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_is_last_segment() {
        assert_eq!(display_name("report.pdf"), "report.pdf");
        assert_eq!(display_name("u1/docs/report.pdf"), "report.pdf");
        assert_eq!(display_name("trailing/"), "");
    }

    #[test]
    fn pdf_detection_ignores_case() {
        assert!(is_pdf("doc.pdf"));
        assert!(is_pdf("DOC.PDF"));
        assert!(is_pdf("scan.Pdf"));
        assert!(!is_pdf("doc.pdf.txt"));
        assert!(!is_pdf("pdf"));
        assert!(!is_pdf("image.png"));
    }

    #[test]
    fn deserializes_with_only_a_name() {
        let file: StoredFile = serde_json::from_str(r#"{"name":"a.txt"}"#).unwrap();
        assert_eq!(file, StoredFile::new("a.txt"));
    }
}
