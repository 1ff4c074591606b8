use std::sync::Arc;

use crate::core::error::Result;
use crate::features::generations::dtos::{GenerationListQuery, GenerationResponseDto, ImageUpload};
use crate::features::generations::models::{Generation, NewGeneration};
use crate::modules::storage::ImageStorage;
use crate::modules::vision::PromptGenerator;
use crate::shared::types::Meta;
use crate::shared::validation::derive_storage_filename;

use super::GenerationStore;

/// Service for the image-to-prompt generation ledger
pub struct GenerationService {
    store: Arc<dyn GenerationStore>,
    storage: Arc<dyn ImageStorage>,
    prompt_generator: Arc<dyn PromptGenerator>,
}

impl GenerationService {
    pub fn new(
        store: Arc<dyn GenerationStore>,
        storage: Arc<dyn ImageStorage>,
        prompt_generator: Arc<dyn PromptGenerator>,
    ) -> Self {
        Self {
            store,
            storage,
            prompt_generator,
        }
    }

    /// List the owner's generations. Records of other owners are never visible.
    pub async fn list_generations(
        &self,
        owner_id: &str,
        query: &GenerationListQuery,
    ) -> Result<(Vec<Generation>, Meta)> {
        let (records, total) = self.store.list(owner_id, query).await?;
        let meta = Meta::new(query.page, query.per_page, total);

        Ok((records, meta))
    }

    /// Store the image, ask the vision model for a prompt, then record the result.
    ///
    /// The upload is expected to be validated already. A failure at any step
    /// aborts the rest, so a record only exists once both the image and its
    /// prompt do. An image stored before a failed prompt request is left in place.
    pub async fn create_generation(&self, owner_id: &str, upload: ImageUpload) -> Result<Generation> {
        let filename = derive_storage_filename(&upload.original_filename);
        let key = self.storage.key_for(&filename);

        let image_path = self
            .storage
            .store(&key, &upload.data, &upload.mime_type)
            .await?;

        let generated_prompt = match self
            .prompt_generator
            .generate_prompt(&upload.data, &upload.mime_type)
            .await
        {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::warn!(
                    "Prompt generation failed, image '{}' kept without a record",
                    image_path
                );
                return Err(e);
            }
        };

        tracing::info!("Generated prompt for '{}': {}", image_path, generated_prompt);

        let file_size = upload.file_size();
        let generation = self
            .store
            .insert(NewGeneration {
                user_id: owner_id.to_string(),
                image_path,
                generated_prompt,
                original_filename: upload.original_filename,
                file_size,
                mime_type: upload.mime_type,
            })
            .await?;

        tracing::info!(
            "Created generation {} for user {}",
            generation.id,
            generation.user_id
        );

        Ok(generation)
    }

    /// Attach a fetchable image URL to each record
    pub async fn present(&self, generation: Generation) -> Result<GenerationResponseDto> {
        let image_url = self.storage.url_for(&generation.image_path).await?;
        Ok(GenerationResponseDto::from_model(generation, image_url))
    }

    pub async fn present_all(
        &self,
        generations: Vec<Generation>,
    ) -> Result<Vec<GenerationResponseDto>> {
        let mut dtos = Vec::with_capacity(generations.len());
        for generation in generations {
            dtos.push(self.present(generation).await?);
        }
        Ok(dtos)
    }
}
