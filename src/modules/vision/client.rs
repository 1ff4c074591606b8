use async_trait::async_trait;
use base64::prelude::*;
use reqwest::Client;

use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatMessageContent, ImageUrl,
    MessagePart,
};
use super::PromptGenerator;
use crate::core::config::VisionConfig;
use crate::core::error::{AppError, Result};

const SYSTEM_PROMPT: &str = "You write prompts for text-to-image models. \
Describe the given image as a single detailed prompt that would let an image \
generation model recreate it: subject, composition, setting, lighting, colors, \
style and mood. Answer with the prompt only, without quotes or preamble.";

const USER_PROMPT: &str = "Generate a detailed prompt for this image.";

/// OpenAI-compatible vision client
pub struct VisionClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl VisionClient {
    pub fn new(config: VisionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key,
            base_url: config.base_url,
            model: config.model,
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, image: &[u8], mime_type: &str) -> ChatCompletionRequest {
        let data_url = format!("data:{};base64,{}", mime_type, BASE64_STANDARD.encode(image));

        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(ChatMessageContent::Text(SYSTEM_PROMPT.to_string())),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(ChatMessageContent::Parts(vec![
                        MessagePart {
                            part_type: "text".to_string(),
                            text: Some(USER_PROMPT.to_string()),
                            image_url: None,
                        },
                        MessagePart {
                            part_type: "image_url".to_string(),
                            text: None,
                            image_url: Some(ImageUrl { url: data_url }),
                        },
                    ])),
                },
            ],
            max_tokens: self.max_tokens,
        }
    }

    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::AiProvider(format!("Vision request timed out: {}", e))
                } else {
                    AppError::AiProvider(format!("Failed to reach vision API: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::AiProvider(format!(
                "Vision API error (status {}): {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::AiProvider(format!("Failed to parse vision response: {}", e)))
    }
}

#[async_trait]
impl PromptGenerator for VisionClient {
    async fn generate_prompt(&self, image: &[u8], mime_type: &str) -> Result<String> {
        tracing::debug!(
            "Requesting prompt from {} for {} image ({} bytes)",
            self.model,
            mime_type,
            image.len()
        );

        let request = self.build_request(image, mime_type);
        let response = self.chat_completion(&request).await?;

        let prompt = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| match choice.message.content {
                Some(ChatMessageContent::Text(text)) => Some(text.trim().to_string()),
                _ => None,
            })
            .filter(|text| !text.is_empty())
            .ok_or_else(|| AppError::AiProvider("Vision API returned no prompt".to_string()))?;

        Ok(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> VisionClient {
        VisionClient::new(VisionConfig {
            api_key: "test-key".to_string(),
            base_url: server.uri(),
            model: "vision-test".to_string(),
            max_tokens: 100,
            timeout: Duration::from_millis(500),
        })
        .unwrap()
    }

    #[test]
    fn test_request_embeds_image_as_data_url() {
        let client = VisionClient::new(VisionConfig {
            api_key: "k".to_string(),
            base_url: "http://localhost".to_string(),
            model: "vision-test".to_string(),
            max_tokens: 42,
            timeout: Duration::from_secs(1),
        })
        .unwrap();

        let body = serde_json::to_value(client.build_request(b"abc", "image/png")).unwrap();

        assert_eq!(body["model"], "vision-test");
        assert_eq!(body["max_tokens"], 42);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(
            body["messages"][1]["content"][1]["image_url"]["url"],
            "data:image/png;base64,YWJj"
        );
    }

    #[tokio::test]
    async fn test_generate_prompt_returns_trimmed_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "  a red bicycle \n" } }
                ]
            })))
            .mount(&server)
            .await;

        let prompt = client_for(&server)
            .generate_prompt(&[0xFF, 0xD8, 0xFF], "image/jpeg")
            .await
            .unwrap();

        assert_eq!(prompt, "a red bicycle");
    }

    #[tokio::test]
    async fn test_generate_prompt_maps_http_error_to_ai_provider() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .generate_prompt(&[0xFF, 0xD8, 0xFF], "image/jpeg")
            .await;

        match result {
            Err(AppError::AiProvider(msg)) => assert!(msg.contains("500")),
            other => panic!("expected AI provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_prompt_rejects_empty_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [ { "message": { "role": "assistant", "content": "   " } } ]
            })))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .generate_prompt(&[0xFF, 0xD8, 0xFF], "image/jpeg")
            .await;

        assert!(matches!(result, Err(AppError::AiProvider(_))));
    }

    #[tokio::test]
    async fn test_generate_prompt_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "choices": [] }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let result = client_for(&server)
            .generate_prompt(&[0xFF, 0xD8, 0xFF], "image/jpeg")
            .await;

        assert!(matches!(result, Err(AppError::AiProvider(_))));
    }
}
