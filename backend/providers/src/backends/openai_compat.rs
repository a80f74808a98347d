use std::time::Instant;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use orderiq_core::{GenerativeBackend, Generation, GenerationRequest};

use super::GenerationOptions;

/// Any `/chat/completions` API: OpenRouter.ai or OpenAI itself.
///
/// Images travel as `data:` URLs in an `image_url` content part.
pub struct OpenAiCompatBackend {
    name: String,
    client: Client,
    api_key: String,
    base_url: String,
    options: GenerationOptions,
}

impl OpenAiCompatBackend {
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            name: name.into(),
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            options,
        }
    }

    pub fn openrouter(api_key: impl Into<String>, options: GenerationOptions) -> Self {
        Self::new("openrouter", api_key, "https://openrouter.ai/api/v1", options)
    }

    pub fn openai(api_key: impl Into<String>, options: GenerationOptions) -> Self {
        Self::new("openai", api_key, "https://api.openai.com/v1", options)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

fn user_message(request: &GenerationRequest) -> ChatMessage {
    let content = match &request.image {
        None => MessageContent::Text(request.prompt.clone()),
        Some(image) => MessageContent::Parts(vec![
            ContentPart::Text {
                text: request.prompt.clone(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: format!(
                        "data:{};base64,{}",
                        image.mime_type,
                        STANDARD.encode(&image.data)
                    ),
                },
            },
        ]),
    };
    ChatMessage {
        role: "user".to_string(),
        content,
    }
}

#[async_trait]
impl GenerativeBackend for OpenAiCompatBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Generation> {
        let start = Instant::now();

        let body = ChatRequest {
            model: self.options.model.clone(),
            messages: vec![user_message(request)],
            max_tokens: Some(self.options.max_tokens),
            temperature: Some(self.options.temperature),
        };

        debug!(backend = %self.name, model = %self.options.model, "Sending chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.options.timeout)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("{} HTTP request failed", self.name))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            bail!("{} returned {}: {}", self.name, status, error_body);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", self.name))?;

        let text = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .with_context(|| format!("{} returned no message content", self.name))?;

        Ok(Generation {
            text,
            backend: self.name.clone(),
            model: self.options.model.clone(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderiq_core::ImageInput;

    #[test]
    fn text_request_uses_plain_string_content() {
        let msg = user_message(&GenerationRequest::text("hello"));
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["role"], "user");
        assert_eq!(v["content"], "hello");
    }

    #[test]
    fn image_request_uses_data_url_part() {
        let req = GenerationRequest::with_image("read", ImageInput::new(vec![1u8, 2, 3], "image/jpeg"));
        let v = serde_json::to_value(user_message(&req)).unwrap();
        assert_eq!(v["content"][0]["type"], "text");
        assert_eq!(v["content"][0]["text"], "read");
        assert_eq!(v["content"][1]["type"], "image_url");
        assert_eq!(v["content"][1]["image_url"]["url"], "data:image/jpeg;base64,AQID");
    }

    #[test]
    fn constructors_name_the_backend() {
        let opts = GenerationOptions::new("gpt-4o-mini");
        assert_eq!(OpenAiCompatBackend::openai("k", opts.clone()).name(), "openai");
        assert_eq!(OpenAiCompatBackend::openrouter("k", opts).name(), "openrouter");
    }
}
