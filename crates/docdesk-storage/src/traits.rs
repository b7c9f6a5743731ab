//! Storage abstraction trait
//!
//! This module defines the Storage trait that all object store backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use docdesk_core::models::{MetadataTags, StoredObject};
use docdesk_core::AppError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => AppError::NotFound(what),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::ConfigError(msg) => AppError::Config(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Receives the cumulative number of bytes sent for one write.
pub trait ProgressSink: Send + Sync {
    fn report(&self, bytes_sent: u64);
}

impl<F> ProgressSink for F
where
    F: Fn(u64) + Send + Sync,
{
    fn report(&self, bytes_sent: u64) {
        self(bytes_sent)
    }
}

/// One object to write.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub collection: String,
    pub key: String,
    pub content_type: String,
    pub metadata: MetadataTags,
    pub payload: Bytes,
}

impl WriteRequest {
    pub fn new(
        collection: impl Into<String>,
        key: impl Into<String>,
        content_type: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            collection: collection.into(),
            key: key.into(),
            content_type: content_type.into(),
            metadata: MetadataTags::new(),
            payload: payload.into(),
        }
    }

    pub fn with_metadata(mut self, metadata: MetadataTags) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn size_bytes(&self) -> u64 {
        self.payload.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub key: String,
    pub url: String,
}

/// Storage abstraction trait
///
/// All object store backends (S3, local filesystem) must implement this trait.
/// Collections are flat namespaces of objects; each object carries a content type and
/// a string-to-string metadata map.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn collection_exists(&self, collection: &str) -> StorageResult<bool>;

    /// Create a collection. Creating one that already exists succeeds.
    async fn create_collection(&self, collection: &str) -> StorageResult<()>;

    /// List every object in a collection with its metadata, ordered by key.
    ///
    /// Returns `StorageError::NotFound` when the collection does not exist.
    async fn list_objects(&self, collection: &str) -> StorageResult<Vec<StoredObject>>;

    /// Write one object, replacing any object with the same key.
    ///
    /// `progress` receives cumulative bytes sent; the calls are non-decreasing and,
    /// on success, the last one equals the payload length.
    async fn write_object(
        &self,
        request: WriteRequest,
        progress: &dyn ProgressSink,
    ) -> StorageResult<WriteReceipt>;

    /// Public URL of an object: `{base_url}/{collection}/{encoded key}`
    fn object_url(&self, collection: &str, key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
