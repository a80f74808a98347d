//! `orderiq extract`: one-shot extraction without the HTTP service.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use orderiq_config::OrderIqConfig;
use orderiq_core::{ExtractionBatch, FieldSchema, ImageInput};
use orderiq_export::{PersistenceSink, XlsxSink};
use orderiq_gateway::mime_detect::{is_image, resolve_upload_mime};
use orderiq_providers::build_pipeline;

use crate::terminal_output::{note_info, note_success, render_table};

#[derive(Debug)]
pub enum ExtractInput {
    Texts(Vec<String>),
    Image(ImageInput),
}

/// Gather the messages or the image named on the command line.
///
/// A `--file` is read whole and becomes one more message after the `--text`s.
pub async fn collect_input(
    mut texts: Vec<String>,
    file: Option<PathBuf>,
    image: Option<PathBuf>,
) -> Result<ExtractInput> {
    if let Some(path) = image {
        return read_image(&path).await.map(ExtractInput::Image);
    }
    if let Some(path) = file {
        let message = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        texts.push(message);
    }
    if texts.iter().all(|t| t.trim().is_empty()) {
        bail!("Nothing to extract: pass --text, --file or --image");
    }
    Ok(ExtractInput::Texts(texts))
}

async fn read_image(path: &Path) -> Result<ImageInput> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path.file_name().and_then(|n| n.to_str());
    let mime = resolve_upload_mime(None, &data, name);
    if !is_image(&mime) {
        bail!("{} is not an image ({mime})", path.display());
    }
    Ok(ImageInput::new(data, mime))
}

pub async fn run(config: &OrderIqConfig, input: ExtractInput, xlsx: bool, table: bool) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    note_info(&format!("Extracting with backend {}", pipeline.backend_name()));

    let batch = match input {
        ExtractInput::Texts(texts) => pipeline.extract_batch(&texts).await?,
        ExtractInput::Image(image) => pipeline.extract_image(image).await?,
    };

    print_batch(&batch, pipeline.schema(), table)?;

    if xlsx {
        let sink = XlsxSink::new(config.output_dir(), pipeline.schema().clone())
            .with_file_prefix(config.file_prefix());
        let handle = sink.persist(Uuid::new_v4(), &batch).await?;
        note_success(&format!(
            "Wrote {} record(s) to {}",
            handle.record_count,
            handle.path.display()
        ));
    }
    Ok(())
}

/// Print records as pretty JSON, or as a table with one column per field.
pub fn print_batch(batch: &ExtractionBatch, schema: &FieldSchema, table: bool) -> Result<()> {
    if table {
        let headers: Vec<&str> = schema.fields().iter().map(String::as_str).collect();
        let rows: Vec<Vec<String>> = batch
            .iter()
            .map(|r| r.values().map(str::to_owned).collect())
            .collect();
        print!("{}", render_table(&headers, &rows, 24));
    } else {
        println!("{}", serde_json::to_string_pretty(batch)?);
    }
    Ok(())
}
