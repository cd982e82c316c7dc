//! Shared constants.

use std::time::Duration;

/// Bucket used when `STORAGE_BUCKET` is not set.
pub const DEFAULT_BUCKET: &str = "avatars";

/// Analysis endpoint used when `ANALYSIS_ENDPOINT` is not set. Development only.
pub const DEFAULT_ANALYSIS_ENDPOINT: &str = "http://localhost:8000/query";

/// Validity of signed URLs handed out for downloads and analysis.
pub const DOWNLOAD_URL_TTL: Duration = Duration::from_secs(60);

/// Validity of share links.
pub const SHARE_URL_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// How long the "Copied!" indicator stays visible after a clipboard write.
pub const COPIED_INDICATOR_DURATION: Duration = Duration::from_secs(2);

/// Upload size limit in megabytes when `MAX_UPLOAD_SIZE_MB` is not set.
pub const DEFAULT_MAX_UPLOAD_SIZE_MB: u64 = 50;

/// Prefix of the natural-language query sent to the analysis endpoint.
pub const ANALYSIS_QUERY_PREFIX: &str = "Process and analyze this document: ";
