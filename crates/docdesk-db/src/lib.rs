//! Docdesk document store
//!
//! The extraction-field registries (personas, query sets, results, quality reviews)
//! are JSON documents kept in named containers of an external document database.
//! This crate defines the `DocumentStore` capability over that database, the
//! `Document` type it exchanges, and an in-memory implementation. The HTTP
//! implementation lives in `docdesk-api-client`.

pub mod document;
pub mod memory;
pub mod traits;

pub use document::Document;
pub use memory::InMemoryDocumentStore;
pub use traits::{DocumentStore, DocumentStoreError, DocumentStoreResult};
