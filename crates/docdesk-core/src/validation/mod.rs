//! Validation modules

pub mod content_type;
pub mod names;

pub use content_type::{content_type_for_filename, DEFAULT_CONTENT_TYPE};
pub use names::{
    normalize_collection_name, validate_collection_name, validate_object_key,
    MAX_COLLECTION_NAME_LENGTH,
};
