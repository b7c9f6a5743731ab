//! Configuration module
//!
//! Loads object storage, document API, and upload settings from the environment
//! (a `.env` file is honoured through dotenvy). Required connection parameters are
//! checked by [`Config::validate`]; a store client must not be built from an invalid
//! configuration.

use std::env;

use crate::storage_types::StorageBackend;

const DEFAULT_COLLECTION: &str = "default";
const LOCAL_STORAGE_PATH: &str = "./data/objects";
const LOCAL_STORAGE_BASE_URL: &str = "http://localhost:3001/objects";

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    // Object storage
    pub storage_backend: StorageBackend,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub aws_region: Option<String>,
    // Document store proxy (GET/POST /api/items/:container)
    pub document_api_url: Option<String>,
    // Uploads
    pub default_collection: String,
    /// Upper bound on in-flight transfers per batch. `None` = all files at once.
    pub max_concurrent_uploads: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            storage_backend: StorageBackend::Local,
            local_storage_path: Some(LOCAL_STORAGE_PATH.to_string()),
            local_storage_base_url: Some(LOCAL_STORAGE_BASE_URL.to_string()),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            document_api_url: None,
            default_collection: DEFAULT_COLLECTION.to_string(),
            max_concurrent_uploads: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::Local,
        };

        let max_concurrent_uploads = match env::var("MAX_CONCURRENT_UPLOADS") {
            Ok(value) => {
                let limit: usize = value.trim().parse().map_err(|_| {
                    anyhow::anyhow!("MAX_CONCURRENT_UPLOADS must be a positive number")
                })?;
                (limit > 0).then_some(limit)
            }
            Err(_) => None,
        };

        let config = Config {
            environment,
            storage_backend,
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .ok()
                .or_else(|| Some(LOCAL_STORAGE_PATH.to_string())),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .ok()
                .or_else(|| Some(LOCAL_STORAGE_BASE_URL.to_string())),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            document_api_url: env::var("DOCUMENT_API_URL").ok(),
            default_collection: env::var("DEFAULT_COLLECTION")
                .unwrap_or_else(|_| DEFAULT_COLLECTION.to_string()),
            max_concurrent_uploads,
        };

        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() || self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        if crate::validation::validate_collection_name(&self.default_collection).is_err() {
            return Err(anyhow::anyhow!(
                "DEFAULT_COLLECTION must be 1-63 characters of lowercase letters, digits or '-'"
            ));
        }

        if let Some(url) = &self.document_api_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow::anyhow!(
                    "DOCUMENT_API_URL must be an http(s) URL"
                ));
            }
        }

        Ok(())
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.storage_backend
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.local_storage_base_url.as_deref()
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.aws_region.as_deref()
    }

    pub fn document_api_url(&self) -> Option<&str> {
        self.document_api_url.as_deref()
    }

    pub fn default_collection(&self) -> &str {
        &self.default_collection
    }

    pub fn max_concurrent_uploads(&self) -> Option<usize> {
        self.max_concurrent_uploads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn s3_backend_requires_bucket_and_region() {
        let mut config = Config {
            storage_backend: StorageBackend::S3,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("S3_BUCKET"));

        config.s3_bucket = Some("documents".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("S3_REGION"));

        config.aws_region = Some("us-east-1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn local_backend_requires_path_and_url() {
        let config = Config {
            local_storage_base_url: None,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_invalid_default_collection() {
        let config = Config {
            default_collection: "Loan Docs".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_http_document_api_url() {
        let config = Config {
            document_api_url: Some("localhost:3001".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn production_detection() {
        let config = Config {
            environment: "Prod".to_string(),
            ..Config::default()
        };
        assert!(config.is_production());
        assert!(!Config::default().is_production());
    }
}
