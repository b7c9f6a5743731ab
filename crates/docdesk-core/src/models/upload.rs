use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use uuid::Uuid;

use super::storage::StoredObject;
use super::tags::MetadataTags;
use crate::validation::content_type_for_filename;

pub const UPLOADED_MESSAGE: &str = "Uploaded";
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed";

/// Per-file upload state. `Waiting -> Uploading -> {Success | Error}`; a task whose
/// collection could not be prepared goes `Waiting -> Error` directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Waiting,
    Uploading,
    Success,
    Error,
}

impl UploadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Success | UploadStatus::Error)
    }

    pub fn can_transition_to(self, next: UploadStatus) -> bool {
        matches!(
            (self, next),
            (UploadStatus::Waiting, UploadStatus::Uploading)
                | (UploadStatus::Waiting, UploadStatus::Error)
                | (UploadStatus::Uploading, UploadStatus::Success)
                | (UploadStatus::Uploading, UploadStatus::Error)
        )
    }
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadStatus::Waiting => write!(f, "waiting"),
            UploadStatus::Uploading => write!(f, "uploading"),
            UploadStatus::Success => write!(f, "success"),
            UploadStatus::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid upload status transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: UploadStatus,
    pub to: UploadStatus,
}

/// Terminal result of one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Success { url: String },
    Failure { reason: String },
}

impl UploadOutcome {
    pub fn success(url: impl Into<String>) -> Self {
        UploadOutcome::Success { url: url.into() }
    }

    /// A blank reason becomes the generic "Upload failed".
    pub fn failure(reason: impl Into<String>) -> Self {
        UploadOutcome::Failure {
            reason: failure_reason(reason.into()),
        }
    }
}

fn failure_reason(reason: String) -> String {
    if reason.trim().is_empty() {
        UPLOAD_FAILED_MESSAGE.to_string()
    } else {
        reason
    }
}

/// Percentage of `total` covered by `sent`, rounded and clamped to 0..=100.
/// An empty file is complete as soon as it is sent.
pub fn progress_percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (sent as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Where a file's bytes come from.
#[derive(Debug, Clone)]
pub enum FileSource {
    Memory(Vec<u8>),
    /// Read when the transfer starts.
    Path(PathBuf),
}

/// A file selected for upload. Immutable once handed to the tracker.
#[derive(Debug, Clone)]
pub struct FileRef {
    pub name: String,
    pub size_bytes: u64,
    pub content_type: String,
    pub source: FileSource,
}

impl FileRef {
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        let name = name.into();
        Self {
            content_type: content_type_for_filename(&name).to_string(),
            size_bytes: data.len() as u64,
            source: FileSource::Memory(data),
            name,
        }
    }

    /// `size_bytes` comes from the caller (typically `fs::metadata`); the name is
    /// the path's final component.
    pub fn from_path(path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            content_type: content_type_for_filename(&name).to_string(),
            size_bytes,
            source: FileSource::Path(path),
            name,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// One entry per file in a batch (or per object in a listing).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadTask {
    pub file_name: String,
    pub size_bytes: u64,
    pub content_type: String,
    pub status: UploadStatus,
    pub progress_percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "MetadataTags::is_empty")]
    pub metadata_tags: MetadataTags,
}

impl UploadTask {
    pub fn waiting(file: &FileRef, metadata_tags: MetadataTags) -> Self {
        Self {
            file_name: file.name.clone(),
            size_bytes: file.size_bytes,
            content_type: file.content_type.clone(),
            status: UploadStatus::Waiting,
            progress_percent: 0,
            result_url: None,
            message: None,
            metadata_tags,
        }
    }

    /// An already-uploaded object, shown the way a finished task is.
    pub fn from_stored(object: &StoredObject) -> Self {
        Self {
            file_name: object.key.clone(),
            size_bytes: object.size_bytes,
            content_type: object
                .content_type
                .clone()
                .unwrap_or_else(|| content_type_for_filename(&object.key).to_string()),
            status: UploadStatus::Success,
            progress_percent: 100,
            result_url: Some(object.url.clone()),
            message: Some(UPLOADED_MESSAGE.to_string()),
            metadata_tags: object.metadata_tags.clone(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn transition(&mut self, next: UploadStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn begin(&mut self) -> Result<(), InvalidTransition> {
        self.transition(UploadStatus::Uploading)?;
        self.progress_percent = 0;
        Ok(())
    }

    /// Apply a cumulative byte count. Returns whether the visible percentage moved.
    /// Ignored unless the task is uploading; never lowers the percentage.
    pub fn record_progress(&mut self, bytes_sent: u64) -> bool {
        if self.status != UploadStatus::Uploading {
            return false;
        }
        let pct = progress_percent(bytes_sent, self.size_bytes);
        if pct > self.progress_percent {
            self.progress_percent = pct;
            true
        } else {
            false
        }
    }

    pub fn complete(&mut self, outcome: UploadOutcome) -> Result<(), InvalidTransition> {
        match outcome {
            UploadOutcome::Success { url } => {
                self.transition(UploadStatus::Success)?;
                self.progress_percent = 100;
                self.result_url = Some(url);
                self.message = Some(UPLOADED_MESSAGE.to_string());
            }
            UploadOutcome::Failure { reason } => {
                self.transition(UploadStatus::Error)?;
                self.result_url = None;
                self.message = Some(failure_reason(reason));
            }
        }
        Ok(())
    }

    /// Fail a task that never started.
    pub fn reject(&mut self, reason: impl Into<String>) -> Result<(), InvalidTransition> {
        if self.status != UploadStatus::Waiting {
            return Err(InvalidTransition {
                from: self.status,
                to: UploadStatus::Error,
            });
        }
        self.status = UploadStatus::Error;
        self.message = Some(failure_reason(reason.into()));
        Ok(())
    }

    /// Bytes implied by the current percentage.
    pub fn transferred_bytes(&self) -> u64 {
        match self.status {
            UploadStatus::Success => self.size_bytes,
            _ => self.size_bytes * u64::from(self.progress_percent) / 100,
        }
    }
}

/// Tasks submitted together, plus the aggregate uploading flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadBatch {
    pub id: Uuid,
    pub collection: String,
    pub tasks: Vec<UploadTask>,
    pub uploading: bool,
}

impl UploadBatch {
    pub fn new(collection: impl Into<String>, tasks: Vec<UploadTask>) -> Self {
        Self {
            id: Uuid::new_v4(),
            collection: collection.into(),
            tasks,
            uploading: false,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.tasks.iter().map(|t| t.size_bytes).sum()
    }

    pub fn transferred_bytes(&self) -> u64 {
        self.tasks.iter().map(UploadTask::transferred_bytes).sum()
    }

    pub fn overall_percent(&self) -> u8 {
        progress_percent(self.transferred_bytes(), self.total_bytes())
    }

    pub fn is_complete(&self) -> bool {
        self.tasks.iter().all(UploadTask::is_terminal)
    }

    pub fn succeeded(&self) -> usize {
        self.count(UploadStatus::Success)
    }

    pub fn failed(&self) -> usize {
        self.count(UploadStatus::Error)
    }

    fn count(&self, status: UploadStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }
}
