//! Config validation: checks that would otherwise surface as a failed request.

use std::collections::HashSet;

use crate::overrides::api_key_var;
use crate::schema::OrderIqConfig;
use thiserror::Error;

/// Providers `orderiq-providers` knows how to build.
pub const KNOWN_PROVIDERS: &[&str] = &["gemini", "openrouter", "openai", "ollama", "mock"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &OrderIqConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_backend(config, &mut report);
    validate_ocr(config, &mut report);
    validate_export(config, &mut report);
    validate_schema(config, &mut report);
    report
}

fn validate_server(config: &OrderIqConfig, report: &mut ValidationReport) {
    if config.port() == 0 {
        report.error("server.port", "Port must be between 1 and 65535");
    }
    if config.max_upload_bytes() == 0 {
        report.error("server.maxUploadBytes", "Upload limit must be greater than zero");
    }
    if config.cors_origins().iter().any(|o| o == "*") {
        report.warn("server.corsOrigins", "CORS allows any origin");
    }
}

fn validate_backend(config: &OrderIqConfig, report: &mut ValidationReport) {
    let provider = config.backend_provider();
    if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
        report.error(
            "backend.provider",
            format!(
                "Unknown provider \"{provider}\"; expected one of {}",
                KNOWN_PROVIDERS.join(", ")
            ),
        );
        return;
    }

    let backend = config.backend.as_ref();
    let has_key = backend
        .and_then(|b| b.api_key.as_ref())
        .is_some_and(|k| !k.trim().is_empty());
    if let Some(var) = api_key_var(&provider) {
        if !has_key {
            report.error(
                "backend.apiKey",
                format!("Provider \"{provider}\" needs an API key (set {var})"),
            );
        }
    }

    if let Some(t) = backend.and_then(|b| b.temperature) {
        if !(0.0..=2.0).contains(&t) {
            report.error("backend.temperature", "Temperature must be between 0.0 and 2.0");
        }
    }
    if backend.and_then(|b| b.max_tokens) == Some(0) {
        report.error("backend.maxTokens", "maxTokens must be greater than zero");
    }
    if backend.and_then(|b| b.timeout_secs) == Some(0) {
        report.error("backend.timeoutSecs", "timeoutSecs must be greater than zero");
    }
    if provider == "mock" {
        report.warn("backend.provider", "Mock backend configured; no model will be called");
    }
}

fn validate_ocr(config: &OrderIqConfig, report: &mut ValidationReport) {
    let Some(ocr) = &config.ocr else { return };
    let provider = ocr.provider.as_deref().unwrap_or("azure");
    if provider != "azure" {
        report.error("ocr.provider", format!("Unknown OCR provider \"{provider}\""));
    }
    if ocr.endpoint.as_deref().map_or(true, |e| e.trim().is_empty()) {
        report.error("ocr.endpoint", "OCR endpoint is required (set AZURE_OCR_ENDPOINT)");
    }
    if ocr.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
        report.error("ocr.apiKey", "OCR key is required (set AZURE_OCR_KEY)");
    }
    if ocr.max_polls == Some(0) {
        report.error("ocr.maxPolls", "maxPolls must be greater than zero");
    }
    report.warn(
        "ocr",
        "Images are sent through OCR; the backend only sees the recognized text",
    );
}

fn validate_export(config: &OrderIqConfig, report: &mut ValidationReport) {
    if config.file_prefix().trim().is_empty() {
        report.error("export.filePrefix", "File prefix cannot be empty");
    }
    let prefix = config.file_prefix();
    if prefix.contains('/') || prefix.contains('\\') || prefix.contains("..") {
        report.error("export.filePrefix", "File prefix cannot contain path separators");
    }
    if config.max_artifacts() == 0 {
        report.error("export.maxArtifacts", "maxArtifacts must be greater than zero");
    }
}

fn validate_schema(config: &OrderIqConfig, report: &mut ValidationReport) {
    let fields = config.schema_fields();
    if fields.is_empty() {
        report.error("schema.fields", "At least one field is required");
    }
    if config.schema_sentinel().trim().is_empty() {
        report.error("schema.sentinel", "Sentinel must be a non-empty string");
    }
    let mut seen = HashSet::new();
    for field in &fields {
        if field.trim().is_empty() {
            report.error("schema.fields", "Field names cannot be empty");
        } else if !seen.insert(field.as_str()) {
            report.error("schema.fields", format!("Duplicate field \"{field}\""));
        }
    }
}
