//! Configuration module
//!
//! Strongly-typed application configuration parsed from the environment with
//! per-field defaults and a fail-fast `validate()` run at startup. Every
//! external endpoint the pipeline depends on (database, blob store, event
//! queue) is an explicit field here; nothing is read from ambient state at
//! request time.

use std::env;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_UPLOAD_SIZE_MB: usize = 25;
const OCR_PAGE_ESTIMATE_MS: u64 = 8_000;

/// Blob storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    S3,
}

/// Event queue backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueBackend {
    /// Log-only publisher; events are traced but not delivered anywhere.
    Logging,
    Sqs,
}

/// Application configuration for the ingestion API.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Blob storage
    pub storage_backend: StorageBackend,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, DigitalOcean Spaces, etc.)
    pub s3_endpoint: Option<String>,
    // Event queue
    pub queue_backend: QueueBackend,
    pub sqs_queue_url: Option<String>,
    pub aws_region: Option<String>,
    // Upload limits
    pub max_upload_size_bytes: usize,
    /// Per-page OCR duration estimate returned by the diary OCR trigger.
    pub ocr_page_estimate_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let storage_backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "s3" => StorageBackend::S3,
            "local" => StorageBackend::Local,
            other => {
                return Err(anyhow::anyhow!(
                    "STORAGE_BACKEND must be 'local' or 's3', got '{}'",
                    other
                ))
            }
        };

        let queue_backend = match env::var("QUEUE_BACKEND")
            .unwrap_or_else(|_| "logging".to_string())
            .to_lowercase()
            .as_str()
        {
            "sqs" => QueueBackend::Sqs,
            "logging" => QueueBackend::Logging,
            other => {
                return Err(anyhow::anyhow!(
                    "QUEUE_BACKEND must be 'logging' or 'sqs', got '{}'",
                    other
                ))
            }
        };

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend,
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            queue_backend,
            sqs_queue_url: env::var("SQS_QUEUE_URL").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            ocr_page_estimate_ms: env::var("OCR_PAGE_ESTIMATE_MS")
                .unwrap_or_else(|_| OCR_PAGE_ESTIMATE_MS.to_string())
                .parse()
                .unwrap_or(OCR_PAGE_ESTIMATE_MS),
        };

        config.validate()?;
        Ok(config)
    }

    /// Fail fast on inconsistent configuration instead of erroring on the
    /// first request that touches the missing dependency.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.database_url.trim().is_empty() {
            return Err(anyhow::anyhow!("DATABASE_URL must not be empty"));
        }

        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.as_deref().unwrap_or("").is_empty() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when STORAGE_BACKEND=s3"
                    ));
                }
                if self.s3_region.as_deref().unwrap_or("").is_empty()
                    && self.aws_region.as_deref().unwrap_or("").is_empty()
                {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when STORAGE_BACKEND=s3"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.as_deref().unwrap_or("").is_empty() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when STORAGE_BACKEND=local"
                    ));
                }
            }
        }

        if self.queue_backend == QueueBackend::Sqs
            && self.sqs_queue_url.as_deref().unwrap_or("").is_empty()
        {
            return Err(anyhow::anyhow!(
                "SQS_QUEUE_URL must be set when QUEUE_BACKEND=sqs"
            ));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server_port: 4000,
            environment: "test".to_string(),
            cors_origins: vec!["*".to_string()],
            database_url: "postgresql://localhost/folklore_test".to_string(),
            db_max_connections: 5,
            db_timeout_seconds: 30,
            storage_backend: StorageBackend::Local,
            local_storage_path: Some("/tmp/folklore-test".to_string()),
            local_storage_base_url: Some("http://localhost:4000/media".to_string()),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            queue_backend: QueueBackend::Logging,
            sqs_queue_url: None,
            aws_region: None,
            max_upload_size_bytes: 25 * 1024 * 1024,
            ocr_page_estimate_ms: 8_000,
        }
    }

    #[test]
    fn test_valid_local_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_s3_backend_requires_bucket() {
        let mut config = base_config();
        config.storage_backend = StorageBackend::S3;
        assert!(config.validate().is_err());

        config.s3_bucket = Some("folklore-media".to_string());
        config.s3_region = Some("us-east-1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sqs_backend_requires_queue_url() {
        let mut config = base_config();
        config.queue_backend = QueueBackend::Sqs;
        assert!(config.validate().is_err());

        config.sqs_queue_url =
            Some("https://sqs.us-east-1.amazonaws.com/123456789/folklore-events".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_rejects_wildcard_cors() {
        let mut config = base_config();
        config.environment = "production".to_string();
        assert!(config.validate().is_err());

        config.cors_origins = vec!["https://app.example.com".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_is_production() {
        let mut config = base_config();
        assert!(!config.is_production());
        config.environment = "Production".to_string();
        assert!(config.is_production());
        config.environment = "prod".to_string();
        assert!(config.is_production());
    }
}
