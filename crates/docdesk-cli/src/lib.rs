use docdesk_core::models::{UploadBatch, UploadStatus, UploadTask};
use docdesk_core::{AppError, ErrorMetadata, LogLevel};
use docdesk_services::DocumentStoreError;
use std::collections::HashMap;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Log `err` at its own level and turn it into the message the user sees.
pub fn user_error(err: AppError) -> anyhow::Error {
    let code = err.error_code();
    let details = err.detailed_message();
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(code, error = %details, "Command failed"),
        LogLevel::Warn => tracing::warn!(code, error = %details, "Command failed"),
        LogLevel::Error => tracing::error!(code, error = %details, "Command failed"),
    }

    let mut message = format!("[{}] {}", code, err.client_message());
    if let Some(action) = err.suggested_action() {
        message.push_str(&format!(" ({})", action));
    }
    anyhow::anyhow!(message)
}

/// `user_error` for document store failures.
pub fn store_error(err: DocumentStoreError) -> anyhow::Error {
    user_error(AppError::from(err))
}

/// One human-readable progress line for a task.
pub fn progress_line(task: &UploadTask) -> String {
    match task.status {
        UploadStatus::Success => format!("{:>4}%  {}  uploaded", 100, task.file_name),
        UploadStatus::Error => format!(
            "{:>4}%  {}  failed: {}",
            task.progress_percent,
            task.file_name,
            task.message.as_deref().unwrap_or_default()
        ),
        status => format!("{:>4}%  {}  {}", task.progress_percent, task.file_name, status),
    }
}

/// Remembers what was last printed per task so only changes are reported.
/// Tasks are keyed by position, since one batch may hold same-named files.
#[derive(Debug, Default)]
pub struct ProgressReport {
    last: HashMap<usize, (UploadStatus, u8)>,
}

impl ProgressReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines for tasks whose status or percentage moved since the previous call.
    pub fn changes(&mut self, batch: &UploadBatch) -> Vec<String> {
        batch
            .tasks
            .iter()
            .enumerate()
            .filter(|(index, task)| {
                let state = (task.status, task.progress_percent);
                self.last.insert(*index, state) != Some(state)
            })
            .map(|(_, task)| progress_line(task))
            .collect()
    }
}
