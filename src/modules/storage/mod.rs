//! Storage module for uploaded images
//!
//! Defines the `ImageStorage` seam used by the generation ledger and its
//! MinIO/S3-compatible implementation.

mod minio_client;

pub use minio_client::MinIOClient;

use async_trait::async_trait;

use crate::core::error::Result;

/// Durable blob store for uploaded images
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Full object key for a derived filename
    fn key_for(&self, filename: &str) -> String;

    /// Persist `data` under `key`, returning the opaque location reference
    async fn store(&self, key: &str, data: &[u8], content_type: &str) -> Result<String>;

    /// Time-limited URL a client can fetch the image from
    async fn url_for(&self, location: &str) -> Result<String>;
}
