use anyhow::Result;
use async_trait::async_trait;

use crate::types::ImageInput;

/// A hosted (or local) generative model that turns a prompt, optionally with
/// an image, into free text.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Backend name (e.g., "gemini", "openrouter").
    fn name(&self) -> &str;

    /// Whether requests may carry an image.
    fn supports_images(&self) -> bool {
        true
    }

    /// Send a generation request and return the response text.
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation>;
}

/// Request to a generative backend.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image: Option<ImageInput>,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    pub fn with_image(prompt: impl Into<String>, image: ImageInput) -> Self {
        Self {
            prompt: prompt.into(),
            image: Some(image),
        }
    }
}

/// Response from a generative backend.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub backend: String,
    pub model: String,
    pub latency_ms: u64,
}
