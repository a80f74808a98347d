use std::time::Instant;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use orderiq_core::{GenerativeBackend, Generation, GenerationRequest};

use super::GenerationOptions;

/// Ollama local model backend. Vision models (e.g. `llava`) take images
/// as base64 strings on the message.
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    options: GenerationOptions,
}

impl OllamaBackend {
    pub fn new(options: GenerationOptions) -> Self {
        Self {
            client: Client::new(),
            base_url: "http://localhost:11434".to_string(),
            options,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Model name without any provider prefix like `ollama/`.
    fn model(&self) -> &str {
        self.options
            .model
            .rsplit('/')
            .next()
            .unwrap_or(&self.options.model)
    }
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize, Deserialize)]
struct OllamaChatMessage {
    role: String,
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
}

impl OllamaBackend {
    fn chat_request(&self, request: &GenerationRequest) -> OllamaChatRequest {
        let images = request
            .image
            .iter()
            .map(|image| STANDARD.encode(&image.data))
            .collect();

        OllamaChatRequest {
            model: self.model().to_string(),
            messages: vec![OllamaChatMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
                images,
            }],
            stream: false,
            options: OllamaOptions {
                temperature: self.options.temperature,
                num_predict: self.options.max_tokens,
            },
        }
    }
}

#[async_trait]
impl GenerativeBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Generation> {
        let start = Instant::now();
        let body = self.chat_request(request);

        debug!(model = %body.model, with_image = request.image.is_some(), "Sending request to Ollama");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .timeout(self.options.timeout)
            .json(&body)
            .send()
            .await
            .context("Ollama HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            bail!("Ollama returned {}: {}", status, error_body);
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(Generation {
            text: chat_response.message.content,
            backend: "ollama".to_string(),
            model: body.model,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderiq_core::ImageInput;

    #[test]
    fn strips_provider_prefix_from_model() {
        let backend = OllamaBackend::new(GenerationOptions::new("ollama/llava"));
        assert_eq!(backend.model(), "llava");
        let backend = OllamaBackend::new(GenerationOptions::new("llama3.2"));
        assert_eq!(backend.model(), "llama3.2");
    }

    #[test]
    fn image_goes_into_message_images() {
        let backend = OllamaBackend::new(GenerationOptions::new("llava").with_max_tokens(64));
        let req = GenerationRequest::with_image("read", ImageInput::new(vec![1u8, 2, 3], "image/png"));
        let v = serde_json::to_value(backend.chat_request(&req)).unwrap();
        assert_eq!(v["stream"], false);
        assert_eq!(v["options"]["num_predict"], 64);
        assert_eq!(v["messages"][0]["images"][0], "AQID");
    }

    #[test]
    fn text_request_has_no_images_key() {
        let backend = OllamaBackend::new(GenerationOptions::new("llava"));
        let v = serde_json::to_value(backend.chat_request(&GenerationRequest::text("hi"))).unwrap();
        assert!(v["messages"][0].get("images").is_none());
    }
}
