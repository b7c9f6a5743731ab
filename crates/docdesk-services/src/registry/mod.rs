//! Typed access to the document store containers.

mod page;

pub use page::{paginate, Page, DEFAULT_PAGE_SIZE};

use docdesk_core::models::{
    Persona, QualityDocument, QuerySet, ResultsDocument, PERSONAS_CONTAINER, QUALITY_CONTAINER,
    QUERY_SETS_CONTAINER, RESULTS_CONTAINER,
};
use docdesk_db::{Document, DocumentStore, DocumentStoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;

/// One container of the document store, read and written as `T`.
pub struct Registry<T> {
    store: Arc<dyn DocumentStore>,
    container: String,
    _entry: PhantomData<fn() -> T>,
}

impl<T> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            container: self.container.clone(),
            _entry: PhantomData,
        }
    }
}

impl<T> Registry<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn DocumentStore>, container: impl Into<String>) -> Self {
        Self {
            store,
            container: container.into(),
            _entry: PhantomData,
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    #[tracing::instrument(skip(self), fields(container = %self.container))]
    pub async fn list(&self) -> DocumentStoreResult<Vec<T>> {
        self.store
            .list_documents(&self.container)
            .await?
            .iter()
            .map(Document::to_typed)
            .collect()
    }

    #[tracing::instrument(skip(self), fields(container = %self.container))]
    pub async fn get(&self, id: &str) -> DocumentStoreResult<Option<T>> {
        self.store
            .get_document(&self.container, id)
            .await?
            .map(|doc| doc.to_typed())
            .transpose()
    }

    /// Insert or replace `entry`; returns it as stored.
    #[tracing::instrument(skip(self, entry), fields(container = %self.container))]
    pub async fn save(&self, entry: &T) -> DocumentStoreResult<T> {
        let document = Document::from_typed(entry)?;
        let stored = self.store.upsert_document(&self.container, document).await?;
        stored.to_typed()
    }
}

impl Registry<Persona> {
    pub fn personas(store: Arc<dyn DocumentStore>) -> Self {
        Self::new(store, PERSONAS_CONTAINER)
    }
}

impl Registry<QuerySet> {
    pub fn query_sets(store: Arc<dyn DocumentStore>) -> Self {
        Self::new(store, QUERY_SETS_CONTAINER)
    }
}

impl Registry<ResultsDocument> {
    pub fn results(store: Arc<dyn DocumentStore>) -> Self {
        Self::new(store, RESULTS_CONTAINER)
    }
}

impl Registry<QualityDocument> {
    pub fn quality(store: Arc<dyn DocumentStore>) -> Self {
        Self::new(store, QUALITY_CONTAINER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use docdesk_core::models::{DataType, QueryField, ResultField};
    use docdesk_db::{DocumentStoreError, InMemoryDocumentStore};

    fn store() -> Arc<dyn DocumentStore> {
        Arc::new(InMemoryDocumentStore::new())
    }

    fn results_doc() -> ResultsDocument {
        ResultsDocument {
            id: "agreement.pdf".to_string(),
            document_name: "agreement.pdf".to_string(),
            document_size: 2048,
            time_imported: "2024-06-01T10:00:00.000Z".to_string(),
            fields: vec![ResultField {
                field_name: "Borrower".to_string(),
                extraction_prompt: "Who is the borrower?".to_string(),
                answer: "ACME Corp".to_string(),
                time_stamp: String::new(),
                data_type: Some("text".to_string()),
            }],
            persona: Some("underwriter".to_string()),
            doc_type: Some("loan".to_string()),
            permission: None,
        }
    }

    #[tokio::test]
    async fn test_save_and_get_query_set() {
        let registry = Registry::query_sets(store());
        let mut query_set = QuerySet {
            id: None,
            document_type: "loan".to_string(),
            fields: vec![QueryField {
                field_name: "Amount".to_string(),
                extraction_prompt: "What is the loan amount?".to_string(),
                data_type: DataType::Currency,
            }],
        };
        query_set.ensure_id();

        let saved = registry.save(&query_set).await.unwrap();
        assert_eq!(saved, query_set);

        let loaded = registry.get("loan").await.unwrap().unwrap();
        assert_eq!(loaded.field("Amount").unwrap().data_type, DataType::Currency);
        assert!(registry.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_set_without_id_is_rejected() {
        let registry = Registry::query_sets(store());
        let query_set = QuerySet {
            id: None,
            document_type: "loan".to_string(),
            fields: Vec::new(),
        };

        assert!(matches!(
            registry.save(&query_set).await,
            Err(DocumentStoreError::InvalidDocument(_))
        ));
    }

    #[tokio::test]
    async fn test_quality_review_from_results() {
        let store = store();
        let results = Registry::results(store.clone());
        let quality = Registry::quality(store);

        let mut doc = results_doc();
        let now = Utc.with_ymd_and_hms(2024, 6, 2, 8, 30, 0).unwrap();
        assert_eq!(doc.stamp_missing_timestamps(now), 1);
        results.save(&doc).await.unwrap();

        let stored = results.get("agreement.pdf").await.unwrap().unwrap();
        let review = QualityDocument::from_results(&stored, "review-1", now);
        quality.save(&review).await.unwrap();

        let reviews = quality.list().await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].fields[0].result.answer, "ACME Corp");
        assert!(!reviews[0].is_fully_approved());
    }

    #[tokio::test]
    async fn test_personas_list_in_id_order() {
        let registry = Registry::personas(store());
        for (id, name) in [("2", "Auditor"), ("1", "Underwriter")] {
            registry
                .save(&Persona {
                    id: id.to_string(),
                    persona_id: name.to_lowercase(),
                    persona_name: name.to_string(),
                    persona_text: String::new(),
                })
                .await
                .unwrap();
        }

        let personas = registry.list().await.unwrap();
        let names: Vec<_> = personas.iter().map(|p| p.persona_name.as_str()).collect();
        assert_eq!(names, vec!["Underwriter", "Auditor"]);

        let page = paginate(personas, 1, DEFAULT_PAGE_SIZE);
        assert_eq!(page.total_pages, 1);
    }
}
