//! Collection name and object key validation.
//!
//! Collection names follow the strictest common container naming rule (lowercase
//! letters, digits, `-`, at most 63 characters) so a name accepted here is valid for
//! every backend. Object keys are flat: one path segment per object.

use crate::error::AppError;

pub const MAX_COLLECTION_NAME_LENGTH: usize = 63;
const MAX_OBJECT_KEY_LENGTH: usize = 1024;

/// Normalize a user-entered collection name: trim and lowercase.
///
/// Returns `None` when nothing is left after trimming.
pub fn normalize_collection_name(raw: &str) -> Option<String> {
    let name = raw.trim().to_lowercase();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

pub fn validate_collection_name(name: &str) -> Result<(), AppError> {
    if name.is_empty() || name.len() > MAX_COLLECTION_NAME_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Collection name must be 1-{} characters: {:?}",
            MAX_COLLECTION_NAME_LENGTH, name
        )));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(AppError::InvalidInput(format!(
            "Collection name may only contain lowercase letters, digits and '-': {:?}",
            name
        )));
    }

    Ok(())
}

pub fn validate_object_key(key: &str) -> Result<(), AppError> {
    if key.is_empty() || key.len() > MAX_OBJECT_KEY_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Object key must be 1-{} bytes",
            MAX_OBJECT_KEY_LENGTH
        )));
    }

    if key.contains("..") || key.contains('/') || key.contains('\\') {
        return Err(AppError::InvalidInput(format!(
            "Object key contains invalid characters: {:?}",
            key
        )));
    }

    // Backends keep bookkeeping entries (`.meta`, `.collection`) under dot-names.
    if key.starts_with('.') {
        return Err(AppError::InvalidInput(format!(
            "Object key must not start with '.': {:?}",
            key
        )));
    }

    if key.chars().any(|c| c.is_control()) {
        return Err(AppError::InvalidInput(
            "Object key contains control characters".to_string(),
        ));
    }

    Ok(())
}
