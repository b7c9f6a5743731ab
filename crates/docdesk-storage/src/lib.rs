//! Docdesk Storage Library
//!
//! This crate provides the object store abstraction used for document uploads and
//! its two backends: the local filesystem and any `object_store` backend (S3 in
//! production).
//!
//! # Layout
//!
//! Objects live in flat, named collections:
//!
//! - **Local**: `{base_path}/{collection}/{key}`, metadata in
//!   `{base_path}/{collection}/.meta/{key}.json`
//! - **S3**: `{collection}/{key}`, metadata as object attributes, collection marker
//!   `{collection}/.collection`
//!
//! Collection names and keys are validated in the `keys` module so all backends accept
//! exactly the same names.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use docdesk_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ProgressSink, Storage, StorageError, StorageResult, WriteReceipt, WriteRequest};
