use crate::keys::{self, COLLECTION_MARKER};
use crate::traits::{ProgressSink, Storage, StorageError, StorageResult, WriteReceipt, WriteRequest};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use docdesk_core::models::{MetadataTags, StoredObject};
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, GetOptions, ObjectMeta, ObjectStore, PutOptions,
    PutPayload,
};
use std::borrow::Cow;
use std::sync::Arc;

/// Object store backed storage (AWS S3 or any S3-compatible provider)
///
/// A collection is the key prefix `{collection}/`; it exists once its marker object
/// `{collection}/.collection` does (or once any object sits under the prefix).
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    base_url: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let base_url = match endpoint_url {
            // Path-style for S3-compatible providers: {endpoint}/{bucket}
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
        };

        Ok(Self::with_store(Arc::new(store), bucket, base_url))
    }

    /// Wrap an existing store, e.g. `object_store::memory::InMemory` in tests.
    pub fn with_store(store: Arc<dyn ObjectStore>, bucket: String, base_url: String) -> Self {
        S3Storage {
            store,
            bucket,
            base_url,
        }
    }

    fn marker(collection: &str) -> Path {
        Path::from(collection).child(COLLECTION_MARKER)
    }

    fn object_path(collection: &str, key: &str) -> Path {
        Path::from(collection).child(key)
    }

    fn attributes_for(request: &WriteRequest) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(request.content_type.clone()),
        );
        for (key, value) in &request.metadata {
            attributes.insert(
                Attribute::Metadata(Cow::Owned(key.clone())),
                AttributeValue::from(value.clone()),
            );
        }
        attributes
    }

    /// Content type and metadata tags from a HEAD of the object.
    async fn read_attributes(&self, location: &Path) -> StorageResult<(Option<String>, MetadataTags)> {
        let options = GetOptions {
            head: true,
            ..Default::default()
        };
        let result = self
            .store
            .get_opts(location, options)
            .await
            .map_err(|e| StorageError::ListFailed(e.to_string()))?;

        let mut content_type = None;
        let mut tags = MetadataTags::new();
        for (attribute, value) in result.attributes.iter() {
            let value: &str = value.as_ref();
            match attribute {
                Attribute::ContentType => content_type = Some(value.to_string()),
                Attribute::Metadata(key) => {
                    tags.insert(key.to_string(), value.to_string());
                }
                _ => {}
            }
        }
        Ok((content_type, tags))
    }

    /// Object key from a listed location; percent-encoding applied by `Path` is undone.
    fn key_of(meta: &ObjectMeta) -> Option<String> {
        let name = meta.location.filename()?;
        let key = urlencoding::decode(name)
            .map(|k| k.into_owned())
            .unwrap_or_else(|_| name.to_string());
        Some(key)
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn collection_exists(&self, collection: &str) -> StorageResult<bool> {
        keys::validate_collection(collection)?;

        let options = GetOptions {
            head: true,
            ..Default::default()
        };
        match self.store.get_opts(&Self::marker(collection), options).await {
            Ok(_) => return Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => return Err(StorageError::BackendError(e.to_string())),
        }

        // Prefixes populated outside docdesk have no marker.
        let prefix = Path::from(collection);
        match self.store.list(Some(&prefix)).next().await {
            Some(Ok(_)) => Ok(true),
            Some(Err(e)) => Err(StorageError::BackendError(e.to_string())),
            None => Ok(false),
        }
    }

    async fn create_collection(&self, collection: &str) -> StorageResult<()> {
        keys::validate_collection(collection)?;

        self.store
            .put_opts(
                &Self::marker(collection),
                PutPayload::from(Bytes::new()),
                PutOptions::default(),
            )
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    collection = %collection,
                    "S3 create collection failed"
                );
                StorageError::BackendError(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.bucket,
            collection = %collection,
            "S3 collection ready"
        );

        Ok(())
    }

    async fn list_objects(&self, collection: &str) -> StorageResult<Vec<StoredObject>> {
        if !self.collection_exists(collection).await? {
            return Err(StorageError::NotFound(format!("Collection {}", collection)));
        }

        let start = std::time::Instant::now();
        let prefix = Path::from(collection);
        let metas: Vec<ObjectMeta> = self
            .store
            .list(Some(&prefix))
            .try_collect()
            .await
            .map_err(|e| StorageError::ListFailed(e.to_string()))?;

        let mut objects = Vec::new();
        for meta in metas {
            let Some(key) = Self::key_of(&meta) else {
                continue;
            };
            if keys::is_hidden(&key) {
                continue;
            }
            let (content_type, metadata_tags) = self.read_attributes(&meta.location).await?;
            objects.push(StoredObject {
                url: self.object_url(collection, &key),
                size_bytes: meta.size,
                last_modified: Some(meta.last_modified),
                content_type,
                metadata_tags,
                key,
            });
        }
        objects.sort_by(|a, b| a.key.cmp(&b.key));

        tracing::debug!(
            bucket = %self.bucket,
            collection = %collection,
            count = objects.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 list successful"
        );

        Ok(objects)
    }

    async fn write_object(
        &self,
        request: WriteRequest,
        progress: &dyn ProgressSink,
    ) -> StorageResult<WriteReceipt> {
        keys::validate(&request.collection, &request.key)?;

        let location = Self::object_path(&request.collection, &request.key);
        let size = request.size_bytes();
        let options = PutOptions {
            attributes: Self::attributes_for(&request),
            ..Default::default()
        };
        let start = std::time::Instant::now();

        self.store
            .put_opts(&location, PutPayload::from(request.payload), options)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    collection = %request.collection,
                    key = %request.key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 write failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;
        progress.report(size);

        let url = self.object_url(&request.collection, &request.key);

        tracing::info!(
            bucket = %self.bucket,
            collection = %request.collection,
            key = %request.key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 write successful"
        );

        Ok(WriteReceipt {
            key: request.key,
            url,
        })
    }

    fn object_url(&self, collection: &str, key: &str) -> String {
        keys::object_url(&self.base_url, collection, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(all(test, feature = "storage-s3"))]
mod tests {
    use super::*;
    use object_store::memory::InMemory;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn storage() -> S3Storage {
        S3Storage::with_store(
            Arc::new(InMemory::new()),
            "documents".to_string(),
            "https://documents.s3.us-east-1.amazonaws.com".to_string(),
        )
    }

    #[tokio::test]
    async fn test_collection_marker() {
        let storage = storage();
        assert!(!storage.collection_exists("reports").await.unwrap());

        storage.create_collection("reports").await.unwrap();
        storage.create_collection("reports").await.unwrap();
        assert!(storage.collection_exists("reports").await.unwrap());
        assert!(!storage.collection_exists("report").await.unwrap());

        // The marker itself is never listed.
        assert!(storage.list_objects("reports").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_preserves_tags() {
        let storage = storage();
        storage.create_collection("reports").await.unwrap();

        let mut metadata = MetadataTags::new();
        metadata.insert("permission".to_string(), "Org-Wide".to_string());
        metadata.insert("persona".to_string(), "underwriter".to_string());

        let sent = AtomicU64::new(0);
        let sink = |bytes: u64| sent.store(bytes, Ordering::SeqCst);
        let request = WriteRequest::new("reports", "Q1 Report.pdf", "application/pdf", b"%PDF".to_vec())
            .with_metadata(metadata.clone());
        let receipt = storage.write_object(request, &sink).await.unwrap();

        assert_eq!(sent.load(Ordering::SeqCst), 4);
        assert_eq!(
            receipt.url,
            "https://documents.s3.us-east-1.amazonaws.com/reports/Q1%20Report.pdf"
        );

        let objects = storage.list_objects("reports").await.unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].key, "Q1 Report.pdf");
        assert_eq!(objects[0].size_bytes, 4);
        assert_eq!(objects[0].content_type.as_deref(), Some("application/pdf"));
        assert_eq!(objects[0].metadata_tags, metadata);
    }

    #[tokio::test]
    async fn test_list_missing_collection_is_not_found() {
        let storage = storage();
        let result = storage.list_objects("empty-collection").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let storage = storage();
        let request = WriteRequest::new("reports", "../secret", "text/plain", b"x".to_vec());
        let result = storage.write_object(request, &|_: u64| {}).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
