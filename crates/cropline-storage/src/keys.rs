//! Shared key validation for storage backends.

use crate::traits::{StorageError, StorageResult};

/// Reject keys that could escape the disk root.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty()
        || storage_key.starts_with('/')
        || storage_key.split('/').any(|segment| segment == "..")
    {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Prepend an optional key prefix (`crops` + `a.jpg` -> `crops/a.jpg`).
#[cfg_attr(not(feature = "storage-s3"), allow(dead_code))]
pub fn with_prefix(prefix: Option<&str>, storage_key: &str) -> String {
    match prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(prefix) if storage_key.is_empty() => prefix.to_string(),
        Some(prefix) => format!("{}/{}", prefix, storage_key),
        None => storage_key.to_string(),
    }
}
