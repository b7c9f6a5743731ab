use crate::document::Document;
use crate::traits::{validate_container, DocumentStore, DocumentStoreResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// Process-local document store. Listings are ordered by id.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    containers: RwLock<HashMap<String, BTreeMap<String, Document>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn container_len(&self, container: &str) -> usize {
        self.containers
            .read()
            .await
            .get(container)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    #[tracing::instrument(skip(self), fields(db.system = "memory", db.operation = "list"))]
    async fn list_documents(&self, container: &str) -> DocumentStoreResult<Vec<Document>> {
        validate_container(container)?;
        let containers = self.containers.read().await;
        Ok(containers
            .get(container)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    #[tracing::instrument(skip(self), fields(db.system = "memory", db.operation = "select"))]
    async fn get_document(
        &self,
        container: &str,
        id: &str,
    ) -> DocumentStoreResult<Option<Document>> {
        validate_container(container)?;
        let containers = self.containers.read().await;
        Ok(containers.get(container).and_then(|docs| docs.get(id)).cloned())
    }

    #[tracing::instrument(skip(self, document), fields(db.system = "memory", db.operation = "upsert", db.record_id = %document.id()))]
    async fn upsert_document(
        &self,
        container: &str,
        document: Document,
    ) -> DocumentStoreResult<Document> {
        validate_container(container)?;
        let mut containers = self.containers.write().await;
        containers
            .entry(container.to_string())
            .or_default()
            .insert(document.id().to_string(), document.clone());
        Ok(document)
    }
}
