//! OCR in front of a generative backend.
//!
//! A text-only model can still read faxes and scans when the image is first
//! run through an [`OcrEngine`] and the recognized text is appended to the
//! extraction prompt.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use orderiq_core::{GenerativeBackend, Generation, GenerationRequest, ImageInput};

const AZURE_READ_PATH: &str =
    "documentintelligence/documentModels/prebuilt-read:analyze?api-version=2024-11-30";

/// Turns an image into plain text.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    async fn recognize(&self, image: &ImageInput) -> Result<String>;
}

/// Azure Document Intelligence `prebuilt-read` model.
///
/// Submits the image, then polls the `Operation-Location` URL until the
/// analysis succeeds, fails, or `max_polls` is exhausted.
pub struct AzureReadOcr {
    client: Client,
    endpoint: String,
    api_key: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl AzureReadOcr {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            poll_interval: Duration::from_secs(1),
            max_polls: 60,
        }
    }

    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    fn analyze_url(&self) -> String {
        format!("{}/{}", self.endpoint, AZURE_READ_PATH)
    }
}

/// Text of a finished analysis, `None` while it is still running.
///
/// Lines are joined page by page with newlines. A body without a `status`
/// is an error report from the service.
pub fn read_result_text(poll: &Value) -> Result<Option<String>> {
    let Some(status) = poll.get("status").and_then(Value::as_str) else {
        let message = poll
            .pointer("/error/message")
            .and_then(Value::as_str)
            .unwrap_or("no status in poll response");
        bail!("Azure OCR poll failed: {message}")
    };
    match status {
        "notStarted" | "running" => Ok(None),
        "succeeded" => {
            let result = poll
                .get("analyzeResult")
                .context("Azure OCR result has no analyzeResult")?;
            let lines: Vec<&str> = result
                .get("pages")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .flat_map(|page| {
                    page.get("lines")
                        .and_then(Value::as_array)
                        .into_iter()
                        .flatten()
                })
                .filter_map(|line| line.get("content").and_then(Value::as_str))
                .collect();
            Ok(Some(lines.join("\n")))
        }
        "failed" => {
            let message = poll
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            bail!("Azure OCR analysis failed: {message}")
        }
        other => bail!("Azure OCR analysis ended with status \"{other}\""),
    }
}

#[async_trait]
impl OcrEngine for AzureReadOcr {
    fn name(&self) -> &str {
        "azure"
    }

    async fn recognize(&self, image: &ImageInput) -> Result<String> {
        let response = self
            .client
            .post(self.analyze_url())
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Content-Type", "application/octet-stream")
            .body(image.data.clone())
            .send()
            .await
            .context("Azure OCR HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            bail!("Azure OCR returned {}: {}", status, error_body);
        }

        let operation = response
            .headers()
            .get("Operation-Location")
            .and_then(|v| v.to_str().ok())
            .context("Azure OCR response has no Operation-Location header")?
            .to_string();

        for attempt in 0..self.max_polls {
            tokio::time::sleep(self.poll_interval).await;
            let response = self
                .client
                .get(&operation)
                .header("Ocp-Apim-Subscription-Key", &self.api_key)
                .send()
                .await
                .context("Azure OCR poll failed")?;

            let status = response.status();
            if !status.is_success() {
                let error_body = response.text().await.unwrap_or_default();
                bail!("Azure OCR poll returned {}: {}", status, error_body);
            }

            let poll: Value = response
                .json()
                .await
                .context("Failed to parse Azure OCR poll response")?;

            if let Some(text) = read_result_text(&poll)? {
                debug!(attempt, chars = text.len(), "Azure OCR finished");
                return Ok(text);
            }
        }
        bail!("Azure OCR timed out after {} polls", self.max_polls)
    }
}

/// Wraps a backend so images are sent as OCR text instead of pixels.
pub struct OcrAssistedBackend {
    inner: Arc<dyn GenerativeBackend>,
    ocr: Arc<dyn OcrEngine>,
    name: String,
}

impl OcrAssistedBackend {
    pub fn new(inner: Arc<dyn GenerativeBackend>, ocr: Arc<dyn OcrEngine>) -> Self {
        let name = format!("{}+{}", inner.name(), ocr.name());
        Self { inner, ocr, name }
    }
}

#[async_trait]
impl GenerativeBackend for OcrAssistedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Generation> {
        let Some(image) = &request.image else {
            return self.inner.generate(request).await;
        };

        let start = Instant::now();
        let text = self.ocr.recognize(image).await?;
        if text.trim().is_empty() {
            bail!("{} OCR found no text in the image", self.ocr.name());
        }
        info!(
            engine = %self.ocr.name(),
            chars = text.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "OCR recognized document text"
        );

        let prompt = format!(
            "{}\n\nThe document text, as read by OCR:\n{}",
            request.prompt.trim_end(),
            text.trim()
        );
        let mut generation = self.inner.generate(&GenerationRequest::text(prompt)).await?;
        generation.backend = self.name.clone();
        Ok(generation)
    }
}
