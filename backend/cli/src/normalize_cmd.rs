//! `orderiq normalize`: run saved raw model output through the normalizer
//! and completer, no backend involved.

use anyhow::{anyhow, Context, Result};
use tokio::io::AsyncReadExt;

use orderiq_config::OrderIqConfig;
use orderiq_core::{normalize, ExtractionBatch, FieldSchema, RecordCompleter};

use crate::extract_cmd::print_batch;
use crate::terminal_output::note_error;

pub fn normalize_to_batch(raw: &str, schema: &FieldSchema) -> Result<ExtractionBatch> {
    let records = normalize(raw).into_result()?;
    Ok(RecordCompleter::new(schema.clone()).complete_all(records).into())
}

async fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut raw = String::new();
        tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .context("Failed to read stdin")?;
        return Ok(raw);
    }
    tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {input}"))
}

pub async fn run(config: &OrderIqConfig, input: &str, table: bool) -> Result<()> {
    let raw = read_input(input).await?;
    let schema = config.field_schema()?;
    match normalize_to_batch(&raw, &schema) {
        Ok(batch) => print_batch(&batch, &schema, table),
        Err(e) => {
            note_error(&format!("{e}"));
            Err(anyhow!("Model output could not be normalized"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_single_quoted_output_is_completed() {
        let raw = "```json\n[{'product': 'Parle-G', 'quantity': '10 packs'}]\n```";
        let batch = normalize_to_batch(raw, &FieldSchema::default()).unwrap();
        assert_eq!(batch.len(), 1);
        let record = &batch.records()[0];
        assert_eq!(record.get("quantity"), Some("10 packs"));
        assert_eq!(record.get("remarks"), Some("unknown"));
    }

    #[test]
    fn refusal_is_an_error() {
        let err = normalize_to_batch("I can't help with that.", &FieldSchema::default()).unwrap_err();
        assert!(err.to_string().contains("no JSON array"));
    }

    #[tokio::test]
    async fn empty_sentinel_is_refused_before_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.txt");
        std::fs::write(&path, r#"[{"product":"Tea"}]"#).unwrap();
        let config: OrderIqConfig =
            serde_yaml::from_str("schema:\n  fields: [product, phone]\n  sentinel: \"\"\n").unwrap();

        let err = run(&config, path.to_str().unwrap(), false).await.unwrap_err();
        assert!(err.to_string().contains("sentinel"));
    }

    #[tokio::test]
    async fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.txt");
        std::fs::write(&path, "[]").unwrap();
        assert_eq!(read_input(path.to_str().unwrap()).await.unwrap(), "[]");
    }
}
