//! OrderIQ runtime configuration schema.
//!
//! Every section and field is optional in the YAML file; `defaults` fills the
//! gaps and the accessors at the bottom fall back to the same constants.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use orderiq_core::{FieldSchema, SchemaError, DEFAULT_SENTINEL, ORDER_FIELDS};

use crate::defaults::*;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIqConfig {
    /// HTTP listener, CORS and upload limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    /// Generative model backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendConfig>,

    /// Optional OCR step in front of a text-only backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr: Option<OcrConfig>,

    /// Spreadsheet output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportConfig>,

    /// Logging configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    /// Record fields and the placeholder for missing values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaConfig>,

    /// Prompt template overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptsConfig>,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// `["*"]` allows any origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors_origins: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// One of `gemini`, `openrouter`, `openai`, `ollama`, `mock`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// HTTP timeout for one backend call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Canned reply for the `mock` provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock_response: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrConfig {
    /// Currently only `azure`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_polls: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_prefix: Option<String>,
    /// How many request → file entries the download index remembers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_artifacts: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentinel: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved accessors
// ---------------------------------------------------------------------------

impl OrderIqConfig {
    pub fn bind_address(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }

    pub fn port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_PORT)
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.server
            .as_ref()
            .and_then(|s| s.cors_origins.clone())
            .unwrap_or_else(|| vec!["*".to_string()])
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.server
            .as_ref()
            .and_then(|s| s.max_upload_bytes)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
    }

    pub fn backend_provider(&self) -> String {
        self.backend
            .as_ref()
            .and_then(|b| b.provider.clone())
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.export
            .as_ref()
            .and_then(|e| e.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    pub fn file_prefix(&self) -> String {
        self.export
            .as_ref()
            .and_then(|e| e.file_prefix.clone())
            .unwrap_or_else(|| DEFAULT_FILE_PREFIX.to_string())
    }

    pub fn max_artifacts(&self) -> usize {
        self.export
            .as_ref()
            .and_then(|e| e.max_artifacts)
            .unwrap_or(DEFAULT_MAX_ARTIFACTS)
    }

    pub fn log_level(&self) -> String {
        self.logging
            .as_ref()
            .and_then(|l| l.level.clone())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
    }

    pub fn schema_fields(&self) -> Vec<String> {
        self.schema
            .as_ref()
            .and_then(|s| s.fields.clone())
            .unwrap_or_else(|| ORDER_FIELDS.iter().map(|f| f.to_string()).collect())
    }

    pub fn schema_sentinel(&self) -> String {
        self.schema
            .as_ref()
            .and_then(|s| s.sentinel.clone())
            .unwrap_or_else(|| DEFAULT_SENTINEL.to_string())
    }

    pub fn field_schema(&self) -> Result<FieldSchema, SchemaError> {
        FieldSchema::new(self.schema_fields(), self.schema_sentinel())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_parses_to_default() {
        let config: OrderIqConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, OrderIqConfig::default());
        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(config.backend_provider(), "gemini");
        assert_eq!(config.field_schema(), Ok(FieldSchema::default()));
    }

    #[test]
    fn camel_case_keys() {
        let yaml = r#"
server:
  port: 9000
  corsOrigins: ["http://localhost:3000"]
export:
  outputDir: /tmp/orders
schema:
  sentinel: "N/A"
"#;
        let config: OrderIqConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.port(), 9000);
        assert_eq!(config.cors_origins(), vec!["http://localhost:3000"]);
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/orders"));
        let schema = config.field_schema().unwrap();
        assert_eq!(schema.sentinel(), "N/A");
        assert_eq!(schema.fields().len(), 9);
    }

    #[test]
    fn empty_sentinel_is_refused() {
        let config: OrderIqConfig = serde_yaml::from_str("schema:\n  sentinel: \"\"\n").unwrap();
        assert_eq!(config.field_schema(), Err(SchemaError::BlankSentinel));
    }
}
