use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;

use crate::features::generations::handlers::{create_generation, list_generations};
use crate::features::generations::services::GenerationService;
use crate::shared::constants::MAX_IMAGE_SIZE;

/// Create routes for the generations feature
pub fn routes(service: Arc<GenerationService>) -> Router {
    Router::new()
        .route(
            "/api/generations",
            get(list_generations)
                .post(create_generation)
                // Allow body size up to MAX_IMAGE_SIZE + buffer for multipart overhead
                .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + 1024 * 1024)),
        )
        .with_state(service)
}
