use crate::document::Document;
use async_trait::async_trait;
use docdesk_core::AppError;
use thiserror::Error;

/// Document store operation errors
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid container name: {0:?}")]
    InvalidContainer(String),

    #[error("Upstream request failed with status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<DocumentStoreError> for AppError {
    fn from(err: DocumentStoreError) -> Self {
        match err {
            DocumentStoreError::Upstream { status, body } => AppError::Upstream { status, body },
            DocumentStoreError::InvalidDocument(msg) => AppError::InvalidInput(msg),
            DocumentStoreError::InvalidContainer(name) => {
                AppError::InvalidInput(format!("Invalid container name: {:?}", name))
            }
            DocumentStoreError::ConfigError(msg) => AppError::Config(msg),
            other => AppError::DocumentStore(other.to_string()),
        }
    }
}

/// Key-value document database, organised in named containers.
///
/// Documents are identified by their string `id`; an upsert with an existing id
/// replaces the stored document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents in a container. An unknown container yields an empty list.
    async fn list_documents(&self, container: &str) -> DocumentStoreResult<Vec<Document>>;

    /// One document by id; `None` when it does not exist.
    async fn get_document(&self, container: &str, id: &str)
        -> DocumentStoreResult<Option<Document>>;

    /// Insert or replace a document, returning the stored version.
    async fn upsert_document(
        &self,
        container: &str,
        document: Document,
    ) -> DocumentStoreResult<Document>;
}

pub(crate) fn validate_container(container: &str) -> DocumentStoreResult<()> {
    if container.trim().is_empty() || container.contains('/') {
        return Err(DocumentStoreError::InvalidContainer(container.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_maps_to_app_upstream() {
        let err: AppError = DocumentStoreError::Upstream {
            status: 500,
            body: "boom".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::Upstream { status: 500, ref body } if body == "boom"));
    }

    #[test]
    fn container_names() {
        assert!(validate_container("Results").is_ok());
        assert!(validate_container(" ").is_err());
        assert!(validate_container("a/b").is_err());
    }
}
