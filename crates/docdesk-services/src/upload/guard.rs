use docdesk_storage::{Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

/// Single-flight "ensure collection exists" per collection name.
///
/// Concurrent callers for one collection wait on the same check; once it succeeds
/// it is never repeated. A failed check is not remembered, so the next call retries.
#[derive(Default)]
pub struct CollectionGuard {
    ready: Mutex<HashMap<String, Arc<OnceCell<()>>>>,
}

impl CollectionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, collection: &str) -> Arc<OnceCell<()>> {
        let mut ready = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        ready.entry(collection.to_string()).or_default().clone()
    }

    pub async fn ensure(&self, storage: &dyn Storage, collection: &str) -> StorageResult<()> {
        let cell = self.cell(collection);
        cell.get_or_try_init(|| async {
            if storage.collection_exists(collection).await? {
                tracing::debug!(collection = %collection, "Collection exists");
            } else {
                storage.create_collection(collection).await?;
                tracing::info!(collection = %collection, "Collection created");
            }
            Ok::<(), StorageError>(())
        })
        .await?;
        Ok(())
    }

    pub fn is_ready(&self, collection: &str) -> bool {
        let ready = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        ready
            .get(collection)
            .is_some_and(|cell| cell.initialized())
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use docdesk_storage::LocalStorage;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_ensure_creates_once() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:3001/objects".to_string())
            .await
            .unwrap();
        let guard = CollectionGuard::new();

        assert!(!guard.is_ready("reports"));
        guard.ensure(&storage, "reports").await.unwrap();
        assert!(guard.is_ready("reports"));
        assert!(storage.collection_exists("reports").await.unwrap());
        guard.ensure(&storage, "reports").await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_check_is_not_remembered() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:3001/objects".to_string())
            .await
            .unwrap();
        let guard = CollectionGuard::new();

        assert!(guard.ensure(&storage, "Bad Name").await.is_err());
        assert!(!guard.is_ready("Bad Name"));
    }
}
