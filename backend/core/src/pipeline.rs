use std::sync::Arc;
use std::time::Instant;

use orderiq_logging::redact_sensitive_data;
use tracing::{debug, info, warn};

use crate::completer::RecordCompleter;
use crate::error::ExtractError;
use crate::normalizer::normalize;
use crate::prompt::PromptSet;
use crate::traits::{GenerativeBackend, Generation, GenerationRequest};
use crate::types::{ExtractionBatch, FieldSchema, ImageInput, OrderRecord};

/// Prompt → backend → normalizer → completer, for one backend.
///
/// Holds no per-request state; share it behind an `Arc`.
pub struct ExtractionPipeline {
    backend: Arc<dyn GenerativeBackend>,
    prompts: PromptSet,
    completer: RecordCompleter,
}

impl ExtractionPipeline {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            prompts: PromptSet::default(),
            completer: RecordCompleter::default(),
        }
    }

    /// Use a different field schema for both prompts and completion.
    pub fn with_schema(mut self, schema: FieldSchema) -> Self {
        self.prompts = PromptSet::new(schema.clone());
        self.completer = RecordCompleter::new(schema);
        self
    }

    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn schema(&self) -> &FieldSchema {
        self.completer.schema()
    }

    /// Extract the orders contained in one free-text message.
    pub async fn extract_text(&self, message: &str) -> Result<Vec<OrderRecord>, ExtractError> {
        let request = GenerationRequest::text(self.prompts.text_prompt(message));
        let generation = self.generate(&request).await?;
        self.records_from(&generation)
    }

    /// Extract every message in submission order.
    ///
    /// Blank messages are skipped. The first response that cannot be
    /// normalized aborts the whole batch.
    pub async fn extract_batch(&self, messages: &[String]) -> Result<ExtractionBatch, ExtractError> {
        if messages.iter().all(|m| m.trim().is_empty()) {
            return Err(ExtractError::EmptyRequest);
        }

        let mut batch = ExtractionBatch::new();
        for (index, message) in messages.iter().enumerate() {
            if message.trim().is_empty() {
                debug!(index, "Skipping blank message");
                continue;
            }
            let records = self.extract_text(message).await?;
            debug!(index, records = records.len(), "Message extracted");
            batch.extend(records);
        }
        Ok(batch)
    }

    /// Extract the orders shown in an image.
    pub async fn extract_image(&self, image: ImageInput) -> Result<ExtractionBatch, ExtractError> {
        if !self.backend.supports_images() {
            return Err(ExtractError::ImagesUnsupported {
                backend: self.backend.name().to_string(),
            });
        }
        if image.data.is_empty() {
            return Err(ExtractError::EmptyRequest);
        }

        let request = GenerationRequest::with_image(self.prompts.image_prompt(), image);
        let generation = self.generate(&request).await?;
        Ok(self.records_from(&generation)?.into())
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, ExtractError> {
        let start = Instant::now();
        let name = self.backend.name().to_string();

        match self.backend.generate(request).await {
            Ok(generation) => {
                info!(
                    backend = %name,
                    model = %generation.model,
                    latency_ms = start.elapsed().as_millis() as u64,
                    with_image = request.image.is_some(),
                    "Backend responded"
                );
                Ok(generation)
            }
            Err(e) => {
                warn!(backend = %name, error = %e, "Backend call failed");
                Err(ExtractError::Unavailable {
                    backend: name,
                    message: format!("{e:#}"),
                })
            }
        }
    }

    fn records_from(&self, generation: &Generation) -> Result<Vec<OrderRecord>, ExtractError> {
        match normalize(&generation.text).into_result() {
            Ok(raw) => {
                let records = self.completer.complete_all(raw);
                debug!(backend = %generation.backend, records = records.len(), "Normalized model output");
                Ok(records)
            }
            Err(err) => {
                warn!(
                    backend = %generation.backend,
                    diagnostic = %err,
                    raw_output = %redact_sensitive_data(err.raw_output()),
                    "Model output could not be normalized"
                );
                Err(err.into())
            }
        }
    }
}
