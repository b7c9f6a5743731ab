//! Error types module
//!
//! This module provides the application-level error type shared by docdesk components.
//! Storage and document-store crates keep their own narrow error enums and convert into
//! `AppError` at the boundary, so callers (the CLI, registries) only handle one type.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to a user or caller.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "STORAGE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried by the user)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Document store error: {0}")]
    DocumentStore(String),

    #[error("Upstream request failed with status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        AppError::Config(_) => (
            "CONFIG_ERROR",
            false,
            Some("Check environment variables and restart"),
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        AppError::DocumentStore(_) => (
            "DOCUMENT_STORE_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        AppError::Upstream { .. } => (
            "UPSTREAM_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Warn,
        ),
        AppError::InvalidInput(_) => (
            "INVALID_INPUT",
            false,
            Some("Check the input and try again"),
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            "NOT_FOUND",
            false,
            Some("Verify the name or ID exists"),
            LogLevel::Debug,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Config(ref msg) => msg.clone(),
            AppError::Storage(ref msg) => msg.clone(),
            AppError::DocumentStore(ref msg) => msg.clone(),
            // The proxy's response body is what the user needs to see.
            AppError::Upstream { body, .. } => body.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "An internal error occurred".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::NotFound("Collection reports".to_string());
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Collection reports");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_upstream_client_message_is_body() {
        let err = AppError::Upstream {
            status: 500,
            body: "Entity with the specified id does not exist".to_string(),
        };
        assert_eq!(err.error_code(), "UPSTREAM_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(
            err.client_message(),
            "Entity with the specified id does not exist"
        );
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_internal_hides_details() {
        let err = AppError::Internal("mutex poisoned".to_string());
        assert_eq!(err.client_message(), "An internal error occurred");
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let source = anyhow::anyhow!("connection reset").context("list objects");
        let err = AppError::from(source);
        let details = err.detailed_message();
        assert!(details.contains("list objects"));
        assert!(details.contains("Caused by"));
    }

    #[test]
    fn test_error_metadata_suggested_actions() {
        let err = AppError::Config("S3_BUCKET not configured".to_string());
        assert_eq!(
            err.suggested_action(),
            Some("Check environment variables and restart")
        );
        assert!(!err.is_recoverable());
    }
}
