//! Shared fixtures for the upload tracker integration tests.

use async_trait::async_trait;
use docdesk_core::models::{FileRef, StoredObject};
use docdesk_services::{
    ProgressSink, Storage, StorageBackend, StorageError, StorageResult, WriteReceipt,
    WriteRequest,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const BASE_URL: &str = "https://objects.example.test";
pub const MIB: usize = 1024 * 1024;

/// In-process object store that records calls and fails on request.
pub struct MockStorage {
    collections: Mutex<HashSet<String>>,
    objects: Mutex<BTreeMap<(String, String), StoredObject>>,
    failing_keys: HashSet<String>,
    failing_checks: AtomicBool,
    create_calls: AtomicUsize,
    steps: u64,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(HashSet::new()),
            objects: Mutex::new(BTreeMap::new()),
            failing_keys: HashSet::new(),
            failing_checks: AtomicBool::new(false),
            create_calls: AtomicUsize::new(0),
            steps: 4,
        }
    }

    /// Writes of `key` fail halfway with a network error.
    pub fn failing_key(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    pub fn fail_checks(&self, fail: bool) {
        self.failing_checks.store(fail, Ordering::SeqCst);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn collection_exists(&self, collection: &str) -> StorageResult<bool> {
        // Long enough for concurrent submits to overlap.
        tokio::time::sleep(Duration::from_millis(20)).await;
        if self.failing_checks.load(Ordering::SeqCst) {
            return Err(StorageError::BackendError("service unavailable".to_string()));
        }
        Ok(self.collections.lock().unwrap().contains(collection))
    }

    async fn create_collection(&self, collection: &str) -> StorageResult<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.collections
            .lock()
            .unwrap()
            .insert(collection.to_string());
        Ok(())
    }

    async fn list_objects(&self, collection: &str) -> StorageResult<Vec<StoredObject>> {
        if !self.collections.lock().unwrap().contains(collection) {
            return Err(StorageError::NotFound(collection.to_string()));
        }
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|((c, _), _)| c == collection)
            .map(|(_, object)| object.clone())
            .collect())
    }

    async fn write_object(
        &self,
        request: WriteRequest,
        progress: &dyn ProgressSink,
    ) -> StorageResult<WriteReceipt> {
        let total = request.size_bytes();

        if self.failing_keys.contains(&request.key) {
            progress.report(total / 2);
            tokio::task::yield_now().await;
            return Err(StorageError::UploadFailed(
                "network error: connection reset".to_string(),
            ));
        }

        for step in 1..=self.steps {
            progress.report(total * step / self.steps);
            tokio::task::yield_now().await;
        }

        let url = self.object_url(&request.collection, &request.key);
        self.objects.lock().unwrap().insert(
            (request.collection.clone(), request.key.clone()),
            StoredObject {
                key: request.key.clone(),
                size_bytes: total,
                last_modified: None,
                content_type: Some(request.content_type.clone()),
                metadata_tags: request.metadata.clone(),
                url: url.clone(),
            },
        );

        Ok(WriteReceipt {
            key: request.key,
            url,
        })
    }

    fn object_url(&self, collection: &str, key: &str) -> String {
        format!("{}/{}/{}", BASE_URL, collection, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

pub fn file(name: &str, size: usize) -> FileRef {
    FileRef::from_bytes(name, vec![0; size])
}
