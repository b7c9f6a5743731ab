use async_trait::async_trait;
use docdesk_core::Config;
use docdesk_db::{Document, DocumentStore, DocumentStoreError, DocumentStoreResult};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

const ITEMS_PATH: &str = "/api/items";

/// `DocumentStore` over the document API proxy.
#[derive(Clone, Debug)]
pub struct HttpDocumentStore {
    client: Client,
    base_url: String,
}

impl HttpDocumentStore {
    pub fn new(base_url: impl Into<String>) -> DocumentStoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| {
                DocumentStoreError::ConfigError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build from `DOCUMENT_API_URL`; refuses to build without it.
    pub fn from_config(config: &Config) -> DocumentStoreResult<Self> {
        let base_url = config.document_api_url().ok_or_else(|| {
            DocumentStoreError::ConfigError("DOCUMENT_API_URL not configured".to_string())
        })?;
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn container_url(&self, container: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            ITEMS_PATH,
            urlencoding::encode(container)
        )
    }

    pub fn document_url(&self, container: &str, id: &str) -> String {
        format!(
            "{}/{}",
            self.container_url(container),
            urlencoding::encode(id)
        )
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> DocumentStoreResult<Response> {
        request
            .send()
            .await
            .map_err(|e| DocumentStoreError::Request(e.to_string()))
    }

    /// Non-2xx responses become `Upstream` carrying the response text.
    async fn check_status(response: Response) -> DocumentStoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::warn!(status = status.as_u16(), body = %body, "Document API request failed");
        Err(DocumentStoreError::Upstream {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> DocumentStoreResult<T> {
        response
            .json()
            .await
            .map_err(|e| DocumentStoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn list_documents(&self, container: &str) -> DocumentStoreResult<Vec<Document>> {
        let url = self.container_url(container);
        let response = self.send(self.client.get(&url)).await?;
        let response = Self::check_status(response).await?;
        let documents: Vec<Document> = Self::decode(response).await?;

        tracing::debug!(container = %container, count = documents.len(), "Listed documents");
        Ok(documents)
    }

    async fn get_document(
        &self,
        container: &str,
        id: &str,
    ) -> DocumentStoreResult<Option<Document>> {
        let url = self.document_url(container, id);
        let response = self.send(self.client.get(&url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check_status(response).await?;
        Ok(Some(Self::decode(response).await?))
    }

    async fn upsert_document(
        &self,
        container: &str,
        document: Document,
    ) -> DocumentStoreResult<Document> {
        let url = self.container_url(container);
        let response = self.send(self.client.post(&url).json(&document)).await?;
        let response = Self::check_status(response).await?;
        let stored: Document = Self::decode(response).await?;

        tracing::info!(container = %container, id = %stored.id(), "Document upserted");
        Ok(stored)
    }
}
