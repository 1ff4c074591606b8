use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// One ledger row per successful image-to-prompt generation. Never updated.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Generation {
    pub id: Uuid,
    /// Subject of the caller that created the record
    pub user_id: String,
    /// Opaque storage location returned by the image store
    pub image_path: String,
    pub generated_prompt: String,
    /// Display name as uploaded, not sanitized
    pub original_filename: String,
    pub file_size: i64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; id and created_at are assigned by the store
#[derive(Debug, Clone)]
pub struct NewGeneration {
    pub user_id: String,
    pub image_path: String,
    pub generated_prompt: String,
    pub original_filename: String,
    pub file_size: i64,
    pub mime_type: String,
}
