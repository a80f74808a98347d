//! `orderiq-config`: OrderIQ runtime configuration.
//!
//! Provides:
//! - Typed config schema (server, backend, OCR, export, logging, record schema)
//! - YAML read/write
//! - `${ENV_VAR}` substitution and environment overrides
//! - Default value application
//! - Validation and redaction for safe display

pub mod defaults;
pub mod env;
pub mod io;
pub mod overrides;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::{apply_all_defaults, default_base_url, default_model};
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{
    apply_merge_patch, config_dir, config_file_path, load_config, resolve_config_path,
    write_config,
};
pub use overrides::{api_key_var, apply_env_overrides, apply_env_overrides_with};
pub use redact::{collect_redacted_paths, redact};
pub use schema::{
    BackendConfig, ExportConfig, LoggingConfig, OcrConfig, OrderIqConfig, PromptsConfig,
    SchemaConfig, ServerConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport, KNOWN_PROVIDERS};

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load `.env`, then the config file, substitute `${VAR}`s, and apply
/// environment overrides and defaults.
///
/// This is the main entry point for loading a config at runtime. It does not
/// validate; run [`validate`] and [`log_report`] once logging is up.
pub async fn load_and_prepare(path: Option<&Path>) -> Result<OrderIqConfig> {
    if let Ok(env_file) = dotenvy::dotenv() {
        tracing::debug!(path = %env_file.display(), "Loaded .env");
    }
    let env: HashMap<String, String> = std::env::vars().collect();
    load_and_prepare_with(&resolve_config_path(path), &env).await
}

/// Emit every warning and error of a validation report.
pub fn log_report(report: &ValidationReport) {
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
}

/// The loading pipeline with an explicit environment.
pub async fn load_and_prepare_with(
    path: &Path,
    env: &HashMap<String, String>,
) -> Result<OrderIqConfig> {
    let raw_config = load_config(path).await?;

    let value: Value =
        serde_json::to_value(&raw_config).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;
    let config: OrderIqConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_env_overrides_with(&config, env)?;
    Ok(apply_all_defaults(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_env_and_defaults_combine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(
            &path,
            "backend:\n  provider: openrouter\n  apiKey: ${OR_KEY}\nserver:\n  port: 7000\n",
        )
        .await
        .unwrap();

        let env: HashMap<String, String> = [
            ("OR_KEY".to_string(), "sk-or-test".to_string()),
            ("ORDERIQ_PORT".to_string(), "7100".to_string()),
        ]
        .into_iter()
        .collect();

        let config = load_and_prepare_with(&path, &env).await.unwrap();
        let backend = config.backend.as_ref().unwrap();
        assert_eq!(backend.api_key.as_deref(), Some("sk-or-test"));
        assert_eq!(backend.model.as_deref(), Some("openai/gpt-4o-mini"));
        assert_eq!(config.port(), 7100);
        assert!(validate(&config).is_valid());
    }

    #[tokio::test]
    async fn unresolved_reference_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(&path, "backend:\n  apiKey: ${NOT_SET_ANYWHERE}\n")
            .await
            .unwrap();
        let err = load_and_prepare_with(&path, &HashMap::new()).await.unwrap_err();
        assert!(format!("{err:#}").contains("NOT_SET_ANYWHERE"));
    }
}
