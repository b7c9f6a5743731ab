//! Docdesk Core Library
//!
//! This crate provides the domain models, error types, configuration, and validation
//! shared by every docdesk component: upload tasks and batches, stored-object records,
//! and the extraction-field registry documents (personas, query sets, results, quality).

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
// Note: Storage, StorageError, StorageResult live in docdesk-storage
// and DocumentStore lives in docdesk-db.
