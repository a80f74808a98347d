use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use orderiq_core::{GenerativeBackend, Generation, GenerationRequest};

/// Prompts kept by a mock backend; older ones are dropped.
pub const MAX_RECORDED_PROMPTS: usize = 64;

/// A backend that returns a canned response and remembers recent prompts.
///
/// Used for offline runs (`provider: mock`) and in tests.
pub struct MockBackend {
    name: String,
    fixed_response: Option<String>,
    failure: Option<String>,
    images: bool,
    prompts: Mutex<VecDeque<String>>,
}

impl MockBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            failure: None,
            images: true,
            prompts: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    /// Every call fails with this message.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn text_only(mut self) -> Self {
        self.images = false;
        self
    }

    /// The most recent prompts received, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("mock")
    }
}

#[async_trait]
impl GenerativeBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_images(&self) -> bool {
        self.images
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Generation> {
        if let Ok(mut prompts) = self.prompts.lock() {
            if prompts.len() == MAX_RECORDED_PROMPTS {
                prompts.pop_front();
            }
            prompts.push_back(request.prompt.clone());
        }
        if let Some(message) = &self.failure {
            return Err(anyhow!("{message}"));
        }
        Ok(Generation {
            text: self
                .fixed_response
                .clone()
                .unwrap_or_else(|| "[]".to_string()),
            backend: self.name.clone(),
            model: "mock".to_string(),
            latency_ms: 0,
        })
    }
}
