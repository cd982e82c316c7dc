//! Shared key generation for storage backends.
//!
//! Key format: `{identity_id}/{file_name}`. The list prefix for an identity is its id.

use crate::{StorageError, StorageResult};

/// List prefix for an identity's namespace.
pub fn identity_prefix(identity_id: &str) -> StorageResult<String> {
    validate_segment(identity_id, "identity id")?;
    Ok(identity_id.to_string())
}

/// Storage key for `file_name` in `identity_id`'s namespace.
///
/// All backends must use this format for consistency.
pub fn object_key(identity_id: &str, file_name: &str) -> StorageResult<String> {
    validate_segment(identity_id, "identity id")?;
    validate_segment(file_name, "file name")?;
    Ok(format!("{}/{}", identity_id, file_name))
}

/// Reject keys that could escape the storage root.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty()
        || storage_key.starts_with('/')
        || storage_key.contains('\\')
        || storage_key.split('/').any(|s| s == ".." || s == ".")
    {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_segment(segment: &str, what: &str) -> StorageResult<()> {
    if segment.trim().is_empty()
        || segment.contains('/')
        || segment.contains('\\')
        || segment == "."
        || segment == ".."
    {
        return Err(StorageError::InvalidKey(format!(
            "Invalid {}: {:?}",
            what, segment
        )));
    }
    Ok(())
}

/// Percent-encode each `/`-separated segment of a key for use in a URL path.
pub fn encode_key_path(storage_key: &str) -> String {
    storage_key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
