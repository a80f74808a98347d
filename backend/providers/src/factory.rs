use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::info;

use orderiq_config::{api_key_var, default_model, OrderIqConfig};
use orderiq_config::defaults::{
    DEFAULT_MAX_TOKENS, DEFAULT_OCR_MAX_POLLS, DEFAULT_OCR_POLL_INTERVAL_MS, DEFAULT_TEMPERATURE,
    DEFAULT_TIMEOUT_SECS,
};
use orderiq_core::{ExtractionPipeline, GenerativeBackend, PromptSet};

use crate::backends::GenerationOptions;
use crate::ocr::{AzureReadOcr, OcrAssistedBackend};
use crate::{GeminiBackend, MockBackend, OllamaBackend, OpenAiCompatBackend};

/// Build the configured generative backend, wrapped with OCR when an `ocr`
/// section is present.
pub fn build_backend(config: &OrderIqConfig) -> Result<Arc<dyn GenerativeBackend>> {
    let provider = config.backend_provider();
    let section = config.backend.clone().unwrap_or_default();

    let options = GenerationOptions::new(
        section
            .model
            .clone()
            .unwrap_or_else(|| default_model(&provider).to_string()),
    )
    .with_temperature(section.temperature.unwrap_or(DEFAULT_TEMPERATURE))
    .with_max_tokens(section.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS))
    .with_timeout(Duration::from_secs(
        section.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
    ));

    let api_key = || {
        section.api_key.clone().filter(|k| !k.is_empty()).with_context(|| {
            format!(
                "Provider '{provider}' needs an API key (set {})",
                api_key_var(&provider).unwrap_or("backend.apiKey")
            )
        })
    };

    let backend: Arc<dyn GenerativeBackend> = match provider.as_str() {
        "gemini" => {
            let mut b = GeminiBackend::new(api_key()?, options);
            if let Some(url) = &section.base_url {
                b = b.with_base_url(url);
            }
            Arc::new(b)
        }
        "openrouter" | "openai" => {
            let mut b = if provider == "openai" {
                OpenAiCompatBackend::openai(api_key()?, options)
            } else {
                OpenAiCompatBackend::openrouter(api_key()?, options)
            };
            if let Some(url) = &section.base_url {
                b = b.with_base_url(url);
            }
            Arc::new(b)
        }
        "ollama" => {
            let mut b = OllamaBackend::new(options);
            if let Some(url) = &section.base_url {
                b = b.with_base_url(url);
            }
            Arc::new(b)
        }
        "mock" => {
            let mut b = MockBackend::default();
            if let Some(response) = &section.mock_response {
                b = b.with_response(response);
            }
            Arc::new(b)
        }
        other => bail!("Unknown backend provider '{other}'"),
    };

    let Some(ocr) = &config.ocr else {
        info!(backend = %backend.name(), "Generative backend ready");
        return Ok(backend);
    };

    let engine = ocr.provider.as_deref().unwrap_or("azure");
    if engine != "azure" {
        bail!("Unknown OCR provider '{engine}'");
    }
    let endpoint = ocr
        .endpoint
        .clone()
        .context("OCR needs an endpoint (set AZURE_OCR_ENDPOINT)")?;
    let key = ocr
        .api_key
        .clone()
        .context("OCR needs an API key (set AZURE_OCR_KEY)")?;
    let azure = AzureReadOcr::new(endpoint, key).with_polling(
        Duration::from_millis(ocr.poll_interval_ms.unwrap_or(DEFAULT_OCR_POLL_INTERVAL_MS)),
        ocr.max_polls.unwrap_or(DEFAULT_OCR_MAX_POLLS),
    );

    let wrapped = OcrAssistedBackend::new(backend, Arc::new(azure));
    info!(backend = %wrapped.name(), "Generative backend ready with OCR");
    Ok(Arc::new(wrapped))
}

/// Build the extraction pipeline: backend, record schema and prompt overrides.
pub fn build_pipeline(config: &OrderIqConfig) -> Result<ExtractionPipeline> {
    let schema = config.field_schema()?;
    let mut prompts = PromptSet::new(schema.clone());
    if let Some(overrides) = &config.prompts {
        if let Some(text) = &overrides.text {
            prompts = prompts.with_text_template(text);
        }
        if let Some(image) = &overrides.image {
            prompts = prompts.with_image_template(image);
        }
    }

    Ok(ExtractionPipeline::new(build_backend(config)?)
        .with_schema(schema)
        .with_prompts(prompts))
}
