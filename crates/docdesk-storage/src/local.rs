use crate::keys::{self, META_DIR};
use crate::traits::{ProgressSink, Storage, StorageError, StorageResult, WriteReceipt, WriteRequest};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docdesk_core::models::{MetadataTags, StoredObject};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const WRITE_CHUNK_SIZE: usize = 64 * 1024;

/// Content type and metadata for one object, stored next to the collection.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectSidecar {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(default)]
    metadata: MetadataTags,
}

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory; each collection is a directory below it
    /// * `base_url` - Base URL for serving objects (e.g., "http://localhost:3001/objects")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    fn collection_dir(&self, collection: &str) -> StorageResult<PathBuf> {
        keys::validate_collection(collection)?;
        Ok(self.base_path.join(collection))
    }

    fn sidecar_path(dir: &Path, key: &str) -> PathBuf {
        dir.join(META_DIR).join(format!("{}.json", key))
    }

    /// Hidden scratch name, unique per write, so concurrent writers of one key
    /// never share a file.
    fn partial_path(dir: &Path, file_name: &str) -> PathBuf {
        dir.join(format!(".{}.{}.partial", file_name, Uuid::new_v4()))
    }

    /// Rename `partial` onto `target`, removing `partial` if the rename fails.
    async fn commit(partial: &Path, target: &Path) -> StorageResult<()> {
        if let Err(e) = fs::rename(partial, target).await {
            let _ = fs::remove_file(partial).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to move file {}: {}",
                target.display(),
                e
            )));
        }
        Ok(())
    }

    async fn write_sidecar(dir: &Path, key: &str, sidecar: &ObjectSidecar) -> StorageResult<()> {
        let meta_dir = dir.join(META_DIR);
        fs::create_dir_all(&meta_dir).await?;
        let json = serde_json::to_vec_pretty(sidecar)
            .map_err(|e| StorageError::UploadFailed(format!("Failed to encode metadata: {}", e)))?;

        let sidecar_path = Self::sidecar_path(dir, key);
        let partial = Self::partial_path(&meta_dir, &format!("{}.json", key));
        if let Err(e) = fs::write(&partial, json).await {
            let _ = fs::remove_file(&partial).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to write metadata {}: {}",
                sidecar_path.display(),
                e
            )));
        }
        Self::commit(&partial, &sidecar_path).await
    }

    async fn dir_exists(path: &Path) -> StorageResult<bool> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::IoError(e)),
        }
    }

    /// A missing or unreadable sidecar yields empty metadata.
    async fn read_sidecar(path: &Path) -> ObjectSidecar {
        let raw = match fs::read(path).await {
            Ok(raw) => raw,
            Err(_) => return ObjectSidecar::default(),
        };
        serde_json::from_slice(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring invalid metadata sidecar");
            ObjectSidecar::default()
        })
    }

    async fn write_payload(
        path: &Path,
        payload: &[u8],
        progress: &dyn ProgressSink,
    ) -> StorageResult<()> {
        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let mut sent = 0u64;
        for chunk in payload.chunks(WRITE_CHUNK_SIZE) {
            file.write_all(chunk).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to write file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            sent += chunk.len() as u64;
            progress.report(sent);
        }
        if payload.is_empty() {
            progress.report(0);
        }

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn collection_exists(&self, collection: &str) -> StorageResult<bool> {
        let dir = self.collection_dir(collection)?;
        Self::dir_exists(&dir).await
    }

    async fn create_collection(&self, collection: &str) -> StorageResult<()> {
        let dir = self.collection_dir(collection)?;
        fs::create_dir_all(dir.join(META_DIR)).await.map_err(|e| {
            StorageError::BackendError(format!(
                "Failed to create collection {}: {}",
                dir.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %dir.display(),
            collection = %collection,
            "Local storage collection ready"
        );

        Ok(())
    }

    async fn list_objects(&self, collection: &str) -> StorageResult<Vec<StoredObject>> {
        let dir = self.collection_dir(collection)?;
        if !Self::dir_exists(&dir).await? {
            return Err(StorageError::NotFound(format!("Collection {}", collection)));
        }

        let start = std::time::Instant::now();
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| StorageError::ListFailed(format!("{}: {}", dir.display(), e)))?;

        let mut objects = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::ListFailed(format!("{}: {}", dir.display(), e)))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if keys::is_hidden(&name) {
                continue;
            }
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }

            let sidecar = Self::read_sidecar(&Self::sidecar_path(&dir, &name)).await;
            objects.push(StoredObject {
                url: self.object_url(collection, &name),
                size_bytes: meta.len(),
                last_modified: meta.modified().ok().map(DateTime::<Utc>::from),
                content_type: sidecar.content_type,
                metadata_tags: sidecar.metadata,
                key: name,
            });
        }
        objects.sort_by(|a, b| a.key.cmp(&b.key));

        tracing::debug!(
            collection = %collection,
            count = objects.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage list successful"
        );

        Ok(objects)
    }

    async fn write_object(
        &self,
        request: WriteRequest,
        progress: &dyn ProgressSink,
    ) -> StorageResult<WriteReceipt> {
        keys::validate(&request.collection, &request.key)?;
        let dir = self.collection_dir(&request.collection)?;
        if !Self::dir_exists(&dir).await? {
            return Err(StorageError::NotFound(format!(
                "Collection {}",
                request.collection
            )));
        }

        let path = dir.join(&request.key);
        // Written under a hidden name and renamed, so listings never see a partial object.
        let partial = Self::partial_path(&dir, &request.key);
        let size = request.payload.len();
        let start = std::time::Instant::now();

        if let Err(e) = Self::write_payload(&partial, &request.payload, progress).await {
            let _ = fs::remove_file(&partial).await;
            return Err(e);
        }
        Self::commit(&partial, &path).await?;

        let sidecar = ObjectSidecar {
            content_type: Some(request.content_type.clone()),
            metadata: request.metadata,
        };
        Self::write_sidecar(&dir, &request.key, &sidecar).await?;

        let url = self.object_url(&request.collection, &request.key);

        tracing::info!(
            path = %path.display(),
            collection = %request.collection,
            key = %request.key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
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
        StorageBackend::Local
    }
}
