//! Config defaults: fills every unset field so the effective config can be shown.

use crate::schema::{
    BackendConfig, ExportConfig, LoggingConfig, OcrConfig, OrderIqConfig, SchemaConfig,
    ServerConfig,
};
use orderiq_core::FieldSchema;

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

/// Fax scans and phone photos stay well under this.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub const DEFAULT_PROVIDER: &str = "gemini";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_OUTPUT_DIR: &str = "outputs";
pub const DEFAULT_FILE_PREFIX: &str = "OrderIQ_Output";
pub const DEFAULT_MAX_ARTIFACTS: usize = 1000;

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_OCR_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_OCR_MAX_POLLS: u32 = 60;

/// Default model for a provider name.
pub fn default_model(provider: &str) -> &'static str {
    match provider {
        "gemini" => "gemini-1.5-flash",
        "openrouter" => "openai/gpt-4o-mini",
        "openai" => "gpt-4o-mini",
        "ollama" => "llava",
        _ => "mock",
    }
}

/// Default API base URL for a provider name.
pub fn default_base_url(provider: &str) -> Option<&'static str> {
    match provider {
        "gemini" => Some("https://generativelanguage.googleapis.com/v1beta"),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "openai" => Some("https://api.openai.com/v1"),
        "ollama" => Some("http://localhost:11434"),
        _ => None,
    }
}

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: OrderIqConfig) -> OrderIqConfig {
    let config = apply_server_defaults(config);
    let config = apply_backend_defaults(config);
    let config = apply_ocr_defaults(config);
    let config = apply_export_defaults(config);
    let config = apply_logging_defaults(config);
    apply_schema_defaults(config)
}

fn apply_server_defaults(mut config: OrderIqConfig) -> OrderIqConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    server.bind.get_or_insert_with(|| DEFAULT_BIND.to_string());
    server.port.get_or_insert(DEFAULT_PORT);
    server
        .cors_origins
        .get_or_insert_with(|| vec!["*".to_string()]);
    server.max_upload_bytes.get_or_insert(DEFAULT_MAX_UPLOAD_BYTES);
    config
}

/// Model and base URL depend on the provider, so the provider is settled first.
fn apply_backend_defaults(mut config: OrderIqConfig) -> OrderIqConfig {
    let backend = config.backend.get_or_insert_with(BackendConfig::default);
    let provider = backend
        .provider
        .get_or_insert_with(|| DEFAULT_PROVIDER.to_string())
        .clone();
    backend
        .model
        .get_or_insert_with(|| default_model(&provider).to_string());
    if backend.base_url.is_none() {
        backend.base_url = default_base_url(&provider).map(str::to_string);
    }
    backend.temperature.get_or_insert(DEFAULT_TEMPERATURE);
    backend.max_tokens.get_or_insert(DEFAULT_MAX_TOKENS);
    backend.timeout_secs.get_or_insert(DEFAULT_TIMEOUT_SECS);
    config
}

/// OCR stays off unless the section exists.
fn apply_ocr_defaults(mut config: OrderIqConfig) -> OrderIqConfig {
    if let Some(ocr) = &mut config.ocr {
        apply_ocr_section_defaults(ocr);
    }
    config
}

fn apply_ocr_section_defaults(ocr: &mut OcrConfig) {
    ocr.provider.get_or_insert_with(|| "azure".to_string());
    ocr.poll_interval_ms.get_or_insert(DEFAULT_OCR_POLL_INTERVAL_MS);
    ocr.max_polls.get_or_insert(DEFAULT_OCR_MAX_POLLS);
}

fn apply_export_defaults(mut config: OrderIqConfig) -> OrderIqConfig {
    let export = config.export.get_or_insert_with(ExportConfig::default);
    export
        .output_dir
        .get_or_insert_with(|| DEFAULT_OUTPUT_DIR.into());
    export
        .file_prefix
        .get_or_insert_with(|| DEFAULT_FILE_PREFIX.to_string());
    export.max_artifacts.get_or_insert(DEFAULT_MAX_ARTIFACTS);
    config
}

fn apply_logging_defaults(mut config: OrderIqConfig) -> OrderIqConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging
        .level
        .get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.json.get_or_insert(false);
    config
}

fn apply_schema_defaults(mut config: OrderIqConfig) -> OrderIqConfig {
    let defaults = FieldSchema::default();
    let schema = config.schema.get_or_insert_with(SchemaConfig::default);
    schema
        .fields
        .get_or_insert_with(|| defaults.fields().to_vec());
    schema
        .sentinel
        .get_or_insert_with(|| defaults.sentinel().to_string());
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_empty_config() {
        let config = apply_all_defaults(OrderIqConfig::default());
        let backend = config.backend.as_ref().unwrap();
        assert_eq!(backend.provider.as_deref(), Some("gemini"));
        assert_eq!(backend.model.as_deref(), Some("gemini-1.5-flash"));
        assert!(backend.base_url.as_deref().unwrap().contains("generativelanguage"));
        assert_eq!(config.port(), DEFAULT_PORT);
        assert!(config.ocr.is_none());
        assert_eq!(
            config.schema.as_ref().unwrap().sentinel.as_deref(),
            Some("unknown")
        );
    }

    #[test]
    fn model_follows_provider() {
        let config = OrderIqConfig {
            backend: Some(BackendConfig {
                provider: Some("ollama".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = apply_all_defaults(config);
        let backend = config.backend.unwrap();
        assert_eq!(backend.model.as_deref(), Some("llava"));
        assert_eq!(backend.base_url.as_deref(), Some("http://localhost:11434"));
    }

    #[test]
    fn keeps_explicit_values() {
        let config = OrderIqConfig {
            backend: Some(BackendConfig {
                provider: Some("openrouter".into()),
                model: Some("google/gemini-flash-1.5".into()),
                temperature: Some(0.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let backend = apply_all_defaults(config).backend.unwrap();
        assert_eq!(backend.model.as_deref(), Some("google/gemini-flash-1.5"));
        assert_eq!(backend.temperature, Some(0.0));
    }

    #[test]
    fn ocr_section_gets_poll_defaults() {
        let config = OrderIqConfig {
            ocr: Some(OcrConfig::default()),
            ..Default::default()
        };
        let ocr = apply_all_defaults(config).ocr.unwrap();
        assert_eq!(ocr.provider.as_deref(), Some("azure"));
        assert_eq!(ocr.max_polls, Some(DEFAULT_OCR_MAX_POLLS));
    }
}
