//! Vision model integration
//!
//! `PromptGenerator` is the seam the generation ledger calls to turn an image
//! into descriptive text. `VisionClient` implements it against any
//! OpenAI-compatible chat completions endpoint.

mod client;
mod types;

pub use client::VisionClient;

use async_trait::async_trait;

use crate::core::error::Result;

/// Produces a descriptive text prompt for an image
#[async_trait]
pub trait PromptGenerator: Send + Sync {
    async fn generate_prompt(&self, image: &[u8], mime_type: &str) -> Result<String>;
}
