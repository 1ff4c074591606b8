use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::generations::{dtos as generations_dtos, handlers as generations_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Generations (protected)
        generations_handlers::list_generations,
        generations_handlers::create_generation,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Generations
            generations_dtos::CreateGenerationDto,
            generations_dtos::GenerationResponseDto,
            ApiResponse<generations_dtos::GenerationResponseDto>,
            ApiResponse<Vec<generations_dtos::GenerationResponseDto>>,
        )
    ),
    tags(
        (name = "generations", description = "Image-to-prompt generations of the authenticated user"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Image Prompt Ledger API",
        version = "0.1.0",
        description = "Turn uploaded images into text-to-image prompts and browse your history",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_generation_endpoints() {
        let doc = ApiDoc::openapi();

        let path = doc
            .paths
            .paths
            .get("/api/generations")
            .expect("generations path documented");
        assert!(path.get.is_some());
        assert!(path.post.is_some());

        let components = doc.components.expect("components present");
        assert!(components.schemas.contains_key("GenerationResponseDto"));
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn test_info_modifier_overrides_metadata() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Ledger".to_string(),
            version: "9.9.9".to_string(),
            description: "custom".to_string(),
        }
        .modify(&mut doc);

        assert_eq!(doc.info.title, "Ledger");
        assert_eq!(doc.info.version, "9.9.9");
        assert_eq!(doc.info.description.as_deref(), Some("custom"));
    }
}
