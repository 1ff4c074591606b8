//! MinIO/S3-compatible storage client
//!
//! Uses rust-s3 crate for lightweight S3 operations. Every image lives under
//! the private prefix and is served through presigned URLs.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use super::ImageStorage;
use crate::core::config::MinIOConfig;
use crate::core::error::{AppError, Result};
use crate::shared::constants::GENERATIONS_STORAGE_DIR;

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    presigned_url_expiry_secs: u32,
    private_prefix: String,
}

impl MinIOClient {
    /// Build the client without touching the network
    pub fn build(config: MinIOConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // Path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        Ok(Self {
            bucket,
            region,
            credentials,
            presigned_url_expiry_secs: config.presigned_url_expiry_secs,
            private_prefix: config.private_prefix.trim_matches('/').to_string(),
        })
    }

    /// Build the client and make sure its bucket exists
    pub async fn connect(config: MinIOConfig) -> Result<Self> {
        let endpoint = config.endpoint.clone();
        let client = Self::build(config)?;
        client.ensure_bucket_exists().await?;

        info!(
            "MinIO client initialized for endpoint: {}, bucket: {}, prefix: {}",
            endpoint,
            client.bucket_name(),
            client.private_prefix
        );

        Ok(client)
    }

    async fn ensure_bucket_exists(&self) -> Result<()> {
        let result = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match result {
            Ok(_) => {
                info!("Bucket '{}' created", self.bucket.name());
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
                Ok(())
            }
        }
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }
}

#[async_trait]
impl ImageStorage for MinIOClient {
    fn key_for(&self, filename: &str) -> String {
        if self.private_prefix.is_empty() {
            return format!("{}/{}", GENERATIONS_STORAGE_DIR, filename);
        }
        format!(
            "{}/{}/{}",
            self.private_prefix, GENERATIONS_STORAGE_DIR, filename
        )
    }

    async fn store(&self, key: &str, data: &[u8], content_type: &str) -> Result<String> {
        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload '{}': {}", key, e)))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(AppError::Storage(format!(
                "Upload of '{}' rejected with HTTP {}",
                key, status
            )));
        }

        debug!(
            "Stored image '{}' ({} bytes) in bucket '{}'",
            key,
            data.len(),
            self.bucket.name()
        );
        Ok(key.to_string())
    }

    async fn url_for(&self, location: &str) -> Result<String> {
        self.bucket
            .presign_get(location, self.presigned_url_expiry_secs, None)
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "Failed to generate presigned URL for '{}': {}",
                    location, e
                ))
            })
    }
}
