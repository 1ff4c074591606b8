mod generation_service;
mod generation_store;

pub use generation_service::GenerationService;
pub use generation_store::{GenerationStore, PgGenerationStore};
