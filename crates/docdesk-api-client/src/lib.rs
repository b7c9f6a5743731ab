//! HTTP client for the document API proxy.
//!
//! The proxy exposes one generic surface over the document database:
//!
//! - `GET  {base}/api/items/{container}` lists a container
//! - `GET  {base}/api/items/{container}/{id}` reads one document (404 when absent)
//! - `POST {base}/api/items/{container}` upserts a JSON document
//!
//! [`HttpDocumentStore`] implements `docdesk_db::DocumentStore` against it, so the
//! registries and the CLI work the same over HTTP as over the in-memory store.

pub mod api;

pub use api::HttpDocumentStore;
