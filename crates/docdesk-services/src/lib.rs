//! Docdesk Services Layer
//!
//! This crate hosts the orchestration the CLI (or any front end) drives: the batch
//! upload tracker with its per-collection guard and pending file selection, and typed
//! registries over the document store. It re-exports the storage and document-store
//! capabilities so callers depend on a single facade.

pub mod registry;
pub mod upload;

pub use docdesk_db::{Document, DocumentStore, DocumentStoreError, InMemoryDocumentStore};
#[cfg(feature = "storage-local")]
pub use docdesk_storage::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use docdesk_storage::S3Storage;
pub use docdesk_storage::{
    create_storage, ProgressSink, Storage, StorageBackend, StorageError, StorageResult,
    WriteReceipt, WriteRequest,
};
pub use registry::{paginate, Page, Registry, DEFAULT_PAGE_SIZE};
pub use upload::{CollectionGuard, FileSelection, UploadTracker};
