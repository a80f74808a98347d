//! `orderiq config`: effective configuration with secrets masked, followed
//! by the validation report.

use std::path::Path;

use anyhow::Result;

use orderiq_config::{collect_redacted_paths, redact, resolve_config_path, validate, OrderIqConfig};

use crate::terminal_output::{note_info, note_success, note_warn, render_table};

/// YAML of the config with every credential masked.
pub fn redacted_yaml(config: &OrderIqConfig) -> Result<String> {
    let value = serde_json::to_value(config)?;
    Ok(serde_yaml::to_string(&redact(&value))?)
}

pub fn run(config: &OrderIqConfig, path: Option<&Path>) -> Result<()> {
    note_info(&format!("Config file: {}", resolve_config_path(path).display()));

    let masked = collect_redacted_paths(&serde_json::to_value(config)?);
    if !masked.is_empty() {
        note_info(&format!("Masked: {}", masked.join(", ")));
    }
    print!("{}", redacted_yaml(config)?);

    let report = validate(config);
    let rows: Vec<Vec<String>> = report
        .errors
        .iter()
        .map(|e| ("error", e))
        .chain(report.warnings.iter().map(|w| ("warning", w)))
        .map(|(level, e)| vec![level.to_string(), e.path.clone(), e.message.clone()])
        .collect();

    if rows.is_empty() {
        note_success("Configuration is valid");
        return Ok(());
    }
    println!();
    print!("{}", render_table(&["level", "path", "message"], &rows, 72));
    if report.is_valid() {
        note_success("Configuration is valid");
    } else {
        note_warn(&format!("{} error(s) found", report.errors.len()));
    }
    Ok(())
}
