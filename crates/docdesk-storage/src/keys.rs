//! Shared naming rules for storage backends.
//!
//! Every backend validates collection names and object keys here, and builds object
//! URLs the same way: `{base_url}/{collection}/{percent-encoded key}`.

use crate::traits::{StorageError, StorageResult};
use docdesk_core::validation;

/// Marker object that makes a prefix-based collection exist.
pub const COLLECTION_MARKER: &str = ".collection";
/// Per-collection directory holding metadata sidecars (local backend).
pub const META_DIR: &str = ".meta";

pub fn validate_collection(collection: &str) -> StorageResult<()> {
    validation::validate_collection_name(collection)
        .map_err(|e| StorageError::InvalidKey(e.to_string()))
}

pub fn validate_key(key: &str) -> StorageResult<()> {
    validation::validate_object_key(key).map_err(|e| StorageError::InvalidKey(e.to_string()))
}

pub fn validate(collection: &str, key: &str) -> StorageResult<()> {
    validate_collection(collection)?;
    validate_key(key)
}

/// Bookkeeping entries (`.meta`, `.collection`, partial writes) are never listed.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

pub fn object_url(base_url: &str, collection: &str, key: &str) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        collection,
        urlencoding::encode(key)
    )
}
