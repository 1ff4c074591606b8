use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::generations::dtos::{
    CreateGenerationDto, GenerationListQuery, GenerationResponseDto, ImageUpload,
    ListGenerationsQuery,
};
use crate::features::generations::services::GenerationService;
use crate::shared::types::ApiResponse;

/// List the caller's generations
#[utoipa::path(
    get,
    path = "/api/generations",
    params(ListGenerationsQuery),
    responses(
        (status = 200, description = "Generations retrieved successfully", body = ApiResponse<Vec<GenerationResponseDto>>),
        (status = 400, description = "Invalid query parameters"),
        (status = 401, description = "Authentication required")
    ),
    tag = "generations",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_generations(
    user: AuthenticatedUser,
    State(service): State<Arc<GenerationService>>,
    Query(params): Query<ListGenerationsQuery>,
) -> Result<Json<ApiResponse<Vec<GenerationResponseDto>>>> {
    params
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let query = GenerationListQuery::from(params);
    let (generations, meta) = service.list_generations(&user.sub, &query).await?;
    let generations = service.present_all(generations).await?;

    Ok(Json(ApiResponse::success(Some(generations), None, Some(meta))))
}

/// Upload an image and generate a prompt for it
///
/// Accepts multipart/form-data with an `image` field. Other fields are ignored.
#[utoipa::path(
    post,
    path = "/api/generations",
    tag = "generations",
    request_body(
        content = CreateGenerationDto,
        content_type = "multipart/form-data",
        description = "Image to describe",
    ),
    responses(
        (status = 201, description = "Generation created successfully", body = ApiResponse<GenerationResponseDto>),
        (status = 400, description = "Missing or invalid image"),
        (status = 401, description = "Authentication required"),
        (status = 413, description = "Image too large"),
        (status = 500, description = "Image could not be stored or recorded"),
        (status = 502, description = "Vision model failed to produce a prompt")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_generation(
    user: AuthenticatedUser,
    State(service): State<Arc<GenerationService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<GenerationResponseDto>>)> {
    let mut upload: Option<ImageUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();
        if field_name != "image" {
            debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        let mime_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let original_filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unnamed".to_string());

        let data = field.bytes().await.map_err(|e| {
            debug!("Failed to read image bytes: {}", e);
            AppError::BadRequest(format!("Failed to read image data: {}", e))
        })?;

        upload = Some(ImageUpload {
            original_filename,
            mime_type,
            data: data.to_vec(),
        });
    }

    let upload = upload.ok_or_else(|| AppError::Validation("Image is required".to_string()))?;
    upload.validate()?;

    let generation = service.create_generation(&user.sub, upload).await?;
    let response = service.present(generation).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(response), None, None)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::generations::routes;
    use crate::shared::test_helpers::{
        with_authenticated_user, InMemoryGenerationStore, InMemoryImageStorage,
        StubPromptGenerator,
    };
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;

    const JPEG: [u8; 5] = [0xFF, 0xD8, 0xFF, 0xE0, 0x00];

    fn service(prompts: StubPromptGenerator) -> Arc<GenerationService> {
        Arc::new(GenerationService::new(
            Arc::new(InMemoryGenerationStore::default()),
            Arc::new(InMemoryImageStorage::default()),
            Arc::new(prompts),
        ))
    }

    fn server_as(service: &Arc<GenerationService>, sub: &str) -> TestServer {
        TestServer::new(with_authenticated_user(routes(service.clone()), sub)).unwrap()
    }

    fn image_form(filename: &str, mime_type: &str, data: &[u8]) -> MultipartForm {
        MultipartForm::new().add_part(
            "image",
            Part::bytes(data.to_vec())
                .file_name(filename)
                .mime_type(mime_type),
        )
    }

    #[tokio::test]
    async fn test_upload_then_list_per_owner() {
        let service = service(StubPromptGenerator::answering("a red bicycle"));
        let u1 = server_as(&service, "u1");
        let u2 = server_as(&service, "u2");

        let response = u1
            .post("/api/generations")
            .multipart(image_form("photo.jpg", "image/jpeg", &JPEG))
            .await;
        response.assert_status(StatusCode::CREATED);

        let created = response.json::<ApiResponse<GenerationResponseDto>>();
        let created = created.data.unwrap();
        assert_eq!(created.generated_prompt, "a red bicycle");
        assert_eq!(created.original_filename, "photo.jpg");
        assert_eq!(created.file_size, 5);
        assert_eq!(created.mime_type, "image/jpeg");
        assert_eq!(created.image_url, format!("memory://{}", created.image_path));

        let listed = u1
            .get("/api/generations")
            .await
            .json::<ApiResponse<Vec<GenerationResponseDto>>>();
        let records = listed.data.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, created.id);
        let meta = listed.meta.unwrap();
        assert_eq!(meta.total, 1);
        assert_eq!(meta.per_page, 15);

        let other = u2
            .get("/api/generations")
            .await
            .json::<ApiResponse<Vec<GenerationResponseDto>>>();
        assert!(other.data.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_accepts_search_sort_and_clamps_page_size() {
        let service = service(StubPromptGenerator::answering("a red bicycle"));
        let server = server_as(&service, "u1");

        let response = server
            .get("/api/generations")
            .add_query_param("search", "RED")
            .add_query_param("sort", "not_a_field")
            .add_query_param("per_page", "1000")
            .await;
        response.assert_status_ok();

        let body = response.json::<ApiResponse<Vec<GenerationResponseDto>>>();
        assert!(body.success);
        assert_eq!(body.meta.unwrap().per_page, 100);
    }

    #[tokio::test]
    async fn test_list_with_huge_page_returns_empty_page() {
        let service = service(StubPromptGenerator::answering("a red bicycle"));
        let server = server_as(&service, "u1");
        server
            .post("/api/generations")
            .multipart(image_form("photo.jpg", "image/jpeg", &JPEG))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .get("/api/generations")
            .add_query_param("page", i64::MAX.to_string())
            .await;
        response.assert_status_ok();

        let body = response.json::<ApiResponse<Vec<GenerationResponseDto>>>();
        assert!(body.data.unwrap().is_empty());
        let meta = body.meta.unwrap();
        assert_eq!(meta.page, i64::MAX);
        assert_eq!(meta.total, 1);
        assert_eq!(meta.total_pages, 1);
    }

    #[tokio::test]
    async fn test_list_rejects_zero_page_size() {
        let service = service(StubPromptGenerator::answering("x"));
        let server = server_as(&service, "u1");

        let response = server
            .get("/api/generations")
            .add_query_param("per_page", "0")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_rejects_invalid_images() {
        let service = service(StubPromptGenerator::answering("x"));
        let server = server_as(&service, "u1");

        server
            .post("/api/generations")
            .multipart(image_form("doc.pdf", "application/pdf", b"%PDF-1.7"))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .post("/api/generations")
            .multipart(image_form("fake.png", "image/png", b"plain text"))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .post("/api/generations")
            .multipart(MultipartForm::new().add_text("caption", "no image here"))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let listed = server
            .get("/api/generations")
            .await
            .json::<ApiResponse<Vec<GenerationResponseDto>>>();
        assert!(listed.data.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_maps_ai_failure_to_bad_gateway() {
        let service = service(StubPromptGenerator::failing());
        let server = server_as(&service, "u1");

        let response = server
            .post("/api/generations")
            .multipart(image_form("photo.jpg", "image/jpeg", &JPEG))
            .await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        let body = response.json::<ApiResponse<()>>();
        assert!(!body.success);
    }

    #[tokio::test]
    async fn test_requires_authenticated_user() {
        let service = service(StubPromptGenerator::answering("x"));
        let server = TestServer::new(routes(service)).unwrap();

        server
            .get("/api/generations")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
