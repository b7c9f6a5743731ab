use bytes::Bytes;
use docdesk_core::models::{
    FileRef, FileSource, MetadataTags, UploadBatch, UploadOutcome, UploadTask,
};
use docdesk_core::validation::normalize_collection_name;
use docdesk_core::{AppError, Config};
use docdesk_storage::{Storage, StorageError, StorageResult, WriteReceipt, WriteRequest};
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::{watch, Semaphore};

use super::guard::CollectionGuard;

/// Drives batches of file uploads into object store collections.
///
/// Each `submit` owns its batch; every change is published as an immutable
/// `Arc<UploadBatch>` on a watch channel, so observers never see a half-applied
/// update. When several batches run at once the channel follows the most recent one.
pub struct UploadTracker {
    storage: Arc<dyn Storage>,
    guard: CollectionGuard,
    limit: Option<Semaphore>,
    snapshots: watch::Sender<Arc<UploadBatch>>,
    in_flight: AtomicUsize,
}

impl UploadTracker {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let (snapshots, _) = watch::channel(Arc::new(UploadBatch::default()));
        Self {
            storage,
            guard: CollectionGuard::new(),
            limit: None,
            snapshots,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn from_config(storage: Arc<dyn Storage>, config: &Config) -> Self {
        Self::new(storage).with_max_concurrent_uploads(config.max_concurrent_uploads())
    }

    /// Bound the number of transfers running at once. `None` (or 0) means unbounded.
    pub fn with_max_concurrent_uploads(mut self, max: Option<usize>) -> Self {
        self.limit = max.filter(|n| *n > 0).map(Semaphore::new);
        self
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<UploadBatch>> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> Arc<UploadBatch> {
        self.snapshots.borrow().clone()
    }

    pub fn is_uploading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Upload `files` into `collection`, tagging every object with `tags`.
    ///
    /// Resolves once every task is `Success` or `Error`. A blank collection name or
    /// an empty file list returns an empty batch without touching storage.
    #[tracing::instrument(skip_all, fields(collection = %collection, files = files.len()))]
    pub async fn submit(
        &self,
        collection: &str,
        files: Vec<FileRef>,
        tags: MetadataTags,
    ) -> Arc<UploadBatch> {
        let collection = match normalize_collection_name(collection) {
            Some(name) if !files.is_empty() => name,
            _ => return Arc::new(UploadBatch::new(collection.trim(), Vec::new())),
        };

        let tasks = files
            .iter()
            .map(|file| UploadTask::waiting(file, tags.clone()))
            .collect();
        let mut batch = UploadBatch::new(collection.clone(), tasks);
        batch.uploading = true;

        let _in_flight = InFlight::enter(&self.in_flight);
        self.snapshots.send_replace(Arc::new(batch.clone()));
        let run = BatchRun {
            batch: Mutex::new(batch),
            snapshots: &self.snapshots,
        };

        let start = Instant::now();
        match self.guard.ensure(self.storage.as_ref(), &collection).await {
            Ok(()) => {
                let transfers = files
                    .into_iter()
                    .enumerate()
                    .map(|(index, file)| self.transfer(&run, &collection, index, file, &tags));
                join_all(transfers).await;
            }
            Err(e) => {
                tracing::warn!(
                    collection = %collection,
                    error = %e,
                    "Collection unavailable, failing batch"
                );
                let reason = e.to_string();
                run.update(|batch| {
                    for task in batch.tasks.iter_mut() {
                        if let Err(e) = task.reject(reason.clone()) {
                            tracing::warn!(file = %task.file_name, error = %e, "Task not rejected");
                        }
                    }
                    true
                });
            }
        }

        let finished = run.update(|batch| {
            batch.uploading = false;
            true
        });

        tracing::info!(
            collection = %collection,
            succeeded = finished.succeeded(),
            failed = finished.failed(),
            size_bytes = finished.total_bytes(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload batch finished"
        );

        finished
    }

    async fn transfer(
        &self,
        run: &BatchRun<'_>,
        collection: &str,
        index: usize,
        file: FileRef,
        tags: &MetadataTags,
    ) {
        let _permit = match &self.limit {
            Some(limit) => limit.acquire().await.ok(),
            None => None,
        };

        run.update(|batch| match batch.tasks[index].begin() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(file = %file.name, error = %e, "Task not started");
                false
            }
        });

        let start = Instant::now();
        let outcome = match self.write_file(run, collection, index, &file, tags).await {
            Ok(receipt) => {
                tracing::info!(
                    collection = %collection,
                    key = %receipt.key,
                    size_bytes = file.size_bytes,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "File uploaded"
                );
                UploadOutcome::success(receipt.url)
            }
            Err(e) => {
                tracing::warn!(
                    collection = %collection,
                    file = %file.name,
                    error = %e,
                    "File upload failed"
                );
                UploadOutcome::failure(e.to_string())
            }
        };

        run.update(|batch| match batch.tasks[index].complete(outcome) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(file = %file.name, error = %e, "Task not completed");
                false
            }
        });
    }

    async fn write_file(
        &self,
        run: &BatchRun<'_>,
        collection: &str,
        index: usize,
        file: &FileRef,
        tags: &MetadataTags,
    ) -> StorageResult<WriteReceipt> {
        let payload = match &file.source {
            FileSource::Memory(data) => Bytes::from(data.clone()),
            FileSource::Path(path) => Bytes::from(tokio::fs::read(path).await?),
        };

        let request = WriteRequest::new(collection, &file.name, &file.content_type, payload)
            .with_metadata(tags.clone());
        let progress = |sent: u64| {
            run.update(|batch| {
                let moved = batch.tasks[index].record_progress(sent);
                if moved {
                    tracing::debug!(
                        file = %batch.tasks[index].file_name,
                        progress = batch.tasks[index].progress_percent,
                        "Upload progress"
                    );
                }
                moved
            });
        };

        self.storage.write_object(request, &progress).await
    }

    /// Objects already in `collection`, shown as finished tasks. A collection that
    /// does not exist yet lists as empty.
    pub async fn list_existing(&self, collection: &str) -> Result<Vec<UploadTask>, AppError> {
        let Some(collection) = normalize_collection_name(collection) else {
            return Ok(Vec::new());
        };

        match self.storage.list_objects(&collection).await {
            Ok(objects) => Ok(objects.iter().map(UploadTask::from_stored).collect()),
            Err(StorageError::NotFound(_)) => {
                tracing::debug!(collection = %collection, "Collection not found, nothing listed");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// `list_existing` narrowed to objects uploaded for one persona and document type.
    pub async fn list_existing_filtered(
        &self,
        collection: &str,
        persona: &str,
        doc_type: &str,
    ) -> Result<Vec<UploadTask>, AppError> {
        let Some(collection) = normalize_collection_name(collection) else {
            return Ok(Vec::new());
        };

        match self.storage.list_objects(&collection).await {
            Ok(objects) => Ok(objects
                .iter()
                .filter(|object| object.matches_selection(persona, doc_type))
                .map(UploadTask::from_stored)
                .collect()),
            Err(StorageError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

/// The single writer for one submitted batch.
struct BatchRun<'a> {
    batch: Mutex<UploadBatch>,
    snapshots: &'a watch::Sender<Arc<UploadBatch>>,
}

impl BatchRun<'_> {
    /// Apply `change`; when it reports a visible change, publish a fresh snapshot.
    /// Returns the batch as it stands afterwards.
    fn update(&self, change: impl FnOnce(&mut UploadBatch) -> bool) -> Arc<UploadBatch> {
        let mut batch = self.batch.lock().unwrap_or_else(PoisonError::into_inner);
        let changed = change(&mut batch);
        let snapshot = Arc::new(batch.clone());
        if changed {
            self.snapshots.send_if_modified(|current| {
                if current.id != snapshot.id {
                    return false;
                }
                *current = snapshot.clone();
                true
            });
        }
        snapshot
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
