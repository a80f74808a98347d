//! Environment overrides, applied on top of the file as a JSON merge patch.
//!
//! Provider API keys are only picked up for the provider that is actually
//! selected, so an `OPENAI_API_KEY` in the shell never leaks into a Gemini setup.

use anyhow::Result;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::io::apply_merge_patch;
use crate::schema::OrderIqConfig;

/// (env var, section, camelCase field) for plain string overrides.
const STRING_OVERRIDES: &[(&str, &str, &str)] = &[
    ("ORDERIQ_BIND", "server", "bind"),
    ("ORDERIQ_BACKEND", "backend", "provider"),
    ("ORDERIQ_MODEL", "backend", "model"),
    ("ORDERIQ_OUTPUT_DIR", "export", "outputDir"),
    ("ORDERIQ_LOG_LEVEL", "logging", "level"),
    ("ORDERIQ_LOG_DIR", "logging", "dir"),
    ("AZURE_OCR_ENDPOINT", "ocr", "endpoint"),
    ("AZURE_OCR_KEY", "ocr", "apiKey"),
];

/// Env var holding the API key for each provider.
pub fn api_key_var(provider: &str) -> Option<&'static str> {
    match provider {
        "gemini" => Some("GEMINI_API_KEY"),
        "openrouter" => Some("OPENROUTER_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        _ => None,
    }
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &OrderIqConfig) -> Result<OrderIqConfig> {
    let env: HashMap<String, String> = std::env::vars().collect();
    apply_env_overrides_with(config, &env)
}

/// Apply overrides from the given map.
pub fn apply_env_overrides_with(
    config: &OrderIqConfig,
    env: &HashMap<String, String>,
) -> Result<OrderIqConfig> {
    let get = |name: &str| env.get(name).filter(|v| !v.trim().is_empty());
    let mut patch = Map::new();

    for &(var, section, field) in STRING_OVERRIDES {
        if let Some(value) = get(var) {
            set(&mut patch, section, field, json!(value));
        }
    }

    if let Some(port) = get("ORDERIQ_PORT") {
        match port.parse::<u16>() {
            Ok(port) => set(&mut patch, "server", "port", json!(port)),
            Err(_) => tracing::warn!(value = %port, "Ignoring invalid ORDERIQ_PORT"),
        }
    }

    let provider = get("ORDERIQ_BACKEND")
        .cloned()
        .unwrap_or_else(|| config.backend_provider());

    let has_key = config
        .backend
        .as_ref()
        .and_then(|b| b.api_key.as_ref())
        .is_some_and(|k| !k.is_empty());
    if !has_key {
        if let Some(key) = api_key_var(&provider).and_then(get) {
            set(&mut patch, "backend", "apiKey", json!(key));
        }
    }

    if provider == "ollama" {
        if let Some(url) = get("OLLAMA_URL") {
            set(&mut patch, "backend", "baseUrl", json!(url));
        }
    }

    if patch.is_empty() {
        return Ok(config.clone());
    }
    apply_merge_patch(config, &Value::Object(patch))
}

fn set(patch: &mut Map<String, Value>, section: &str, field: &str, value: Value) {
    let entry = patch
        .entry(section.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(map) = entry {
        map.insert(field.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::BackendConfig;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn picks_key_for_selected_provider_only() {
        let config = OrderIqConfig::default();
        let env = env(&[("GEMINI_API_KEY", "g-key"), ("OPENAI_API_KEY", "o-key")]);
        let out = apply_env_overrides_with(&config, &env).unwrap();
        assert_eq!(out.backend.unwrap().api_key.as_deref(), Some("g-key"));
    }

    #[test]
    fn backend_switch_changes_key_source() {
        let env = env(&[
            ("ORDERIQ_BACKEND", "openrouter"),
            ("GEMINI_API_KEY", "g-key"),
            ("OPENROUTER_API_KEY", "or-key"),
        ]);
        let out = apply_env_overrides_with(&OrderIqConfig::default(), &env).unwrap();
        let backend = out.backend.unwrap();
        assert_eq!(backend.provider.as_deref(), Some("openrouter"));
        assert_eq!(backend.api_key.as_deref(), Some("or-key"));
    }

    #[test]
    fn file_key_wins_over_env_key() {
        let config = OrderIqConfig {
            backend: Some(BackendConfig {
                api_key: Some("from-file".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let out = apply_env_overrides_with(&config, &env(&[("GEMINI_API_KEY", "env")])).unwrap();
        assert_eq!(out.backend.unwrap().api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn port_and_paths() {
        let env = env(&[
            ("ORDERIQ_PORT", "9100"),
            ("ORDERIQ_OUTPUT_DIR", "/srv/orders"),
            ("AZURE_OCR_KEY", "az"),
        ]);
        let out = apply_env_overrides_with(&OrderIqConfig::default(), &env).unwrap();
        assert_eq!(out.port(), 9100);
        assert_eq!(out.output_dir(), std::path::PathBuf::from("/srv/orders"));
        assert_eq!(out.ocr.unwrap().api_key.as_deref(), Some("az"));
    }

    #[test]
    fn bad_port_is_ignored() {
        let out =
            apply_env_overrides_with(&OrderIqConfig::default(), &env(&[("ORDERIQ_PORT", "http")]))
                .unwrap();
        assert!(out.server.is_none());
    }

    #[test]
    fn no_env_is_identity() {
        let config = OrderIqConfig::default();
        assert_eq!(apply_env_overrides_with(&config, &HashMap::new()).unwrap(), config);
    }
}
