use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::AppError;
use crate::features::generations::models::Generation;
use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_IMAGE_SIZE, MAX_PAGE_SIZE};
use crate::shared::validation::detect_image_mime;

// =============================================================================
// SORTING
// =============================================================================

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Columns a generation listing can be ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerationSortField {
    #[default]
    CreatedAt,
    GeneratedPrompt,
    OriginalFilename,
    FileSize,
}

impl GenerationSortField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "created_at" => Some(Self::CreatedAt),
            "generated_prompt" => Some(Self::GeneratedPrompt),
            "original_filename" => Some(Self::OriginalFilename),
            "file_size" => Some(Self::FileSize),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::GeneratedPrompt => "generated_prompt",
            Self::OriginalFilename => "original_filename",
            Self::FileSize => "file_size",
        }
    }
}

/// Parsed `sort` parameter. Defaults to newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationSort {
    pub field: GenerationSortField,
    pub direction: SortDirection,
}

impl GenerationSort {
    /// Parse `[-]field`. Total over all inputs: an unknown field, a bare `-`, or
    /// no value at all silently yields the default (`created_at` descending).
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        let (direction, name) = match raw.strip_prefix('-') {
            Some(rest) => (SortDirection::Desc, rest),
            None => (SortDirection::Asc, raw),
        };

        match GenerationSortField::from_name(name) {
            Some(field) => Self { field, direction },
            None => Self::default(),
        }
    }
}

// =============================================================================
// LISTING
// =============================================================================

/// Query params for listing the caller's generations
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListGenerationsQuery {
    /// Case-insensitive substring to look for in the generated prompt
    #[validate(length(max = 500, message = "search must be at most 500 characters"))]
    pub search: Option<String>,
    /// Sort field, prefixed with `-` for descending. One of `created_at`,
    /// `generated_prompt`, `original_filename`, `file_size`. Defaults to `-created_at`.
    #[param(example = "-created_at")]
    pub sort: Option<String>,
    /// Items per page (default: 15, max: 100)
    #[validate(range(min = 1, message = "per_page must be a positive integer"))]
    #[param(minimum = 1, maximum = 100)]
    pub per_page: Option<i64>,
    /// Page number (1-indexed, default: 1)
    #[validate(range(min = 1, message = "page must be a positive integer"))]
    #[param(minimum = 1)]
    pub page: Option<i64>,
}

/// Normalized listing input handed to the service and store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationListQuery {
    /// Present only when non-empty
    pub search: Option<String>,
    pub sort: GenerationSort,
    pub page: i64,
    pub per_page: i64,
}

impl GenerationListQuery {
    /// Rows to skip. Saturates so an absurdly large page reads past the end.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

impl Default for GenerationListQuery {
    fn default() -> Self {
        ListGenerationsQuery::default().into()
    }
}

impl From<ListGenerationsQuery> for GenerationListQuery {
    fn from(params: ListGenerationsQuery) -> Self {
        Self {
            search: params.search.filter(|s| !s.is_empty()),
            sort: GenerationSort::parse(params.sort.as_deref()),
            page: params.page.unwrap_or(1).max(1),
            per_page: params
                .per_page
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

// =============================================================================
// UPLOAD
// =============================================================================

/// Allowed MIME types for image uploads
pub const ALLOWED_IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Create generation request for OpenAPI documentation.
/// The handler reads the multipart body directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CreateGenerationDto {
    /// The image to describe (jpeg, png, gif or webp, max 10MB)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image: String,
}

/// An uploaded image as received from the client
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub original_filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImageUpload {
    pub fn file_size(&self) -> i64 {
        self.data.len() as i64
    }

    /// Reject anything that is not a recognized image under the size limit
    pub fn validate(&self) -> Result<(), AppError> {
        if self.data.is_empty() {
            return Err(AppError::Validation("The image must not be empty".to_string()));
        }

        if self.data.len() > MAX_IMAGE_SIZE {
            return Err(AppError::Validation(format!(
                "Image too large. Maximum size is {} bytes ({} MB)",
                MAX_IMAGE_SIZE,
                MAX_IMAGE_SIZE / 1024 / 1024
            )));
        }

        if !ALLOWED_IMAGE_MIME_TYPES.contains(&self.mime_type.as_str()) {
            return Err(AppError::Validation(format!(
                "File type '{}' is not allowed. Allowed types: {}",
                self.mime_type,
                ALLOWED_IMAGE_MIME_TYPES.join(", ")
            )));
        }

        if detect_image_mime(&self.data).is_none() {
            return Err(AppError::Validation(
                "The uploaded file is not a recognized image".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// A generation as returned to its owner
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerationResponseDto {
    pub id: Uuid,
    /// Prompt produced by the vision model
    pub generated_prompt: String,
    /// Filename as uploaded
    pub original_filename: String,
    /// Size of the image in bytes
    pub file_size: i64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
    /// Storage key of the image
    pub image_path: String,
    /// Time-limited URL to fetch the image
    pub image_url: String,
}

impl GenerationResponseDto {
    pub fn from_model(generation: Generation, image_url: String) -> Self {
        Self {
            id: generation.id,
            generated_prompt: generation.generated_prompt,
            original_filename: generation.original_filename,
            file_size: generation.file_size,
            mime_type: generation.mime_type,
            created_at: generation.created_at,
            image_path: generation.image_path,
            image_url,
        }
    }
}
