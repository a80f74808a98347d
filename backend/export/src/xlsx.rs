use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Workbook};
use tracing::info;
use uuid::Uuid;

use orderiq_core::{ExtractionBatch, FieldSchema};

use crate::sink::{ArtifactHandle, PersistenceSink};

/// One worksheet per request: a header row of field names, then one row
/// per record in batch order.
pub struct XlsxSink {
    output_dir: PathBuf,
    file_prefix: String,
    schema: FieldSchema,
}

impl XlsxSink {
    pub fn new(output_dir: impl Into<PathBuf>, schema: FieldSchema) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_prefix: "OrderIQ_Output".to_string(),
            schema,
        }
    }

    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `<prefix>_<YYYYMMDD-HHMMSS>_<first 8 hex of request id>.xlsx`
    pub fn file_name(&self, request_id: Uuid, at: DateTime<Utc>) -> String {
        let id = request_id.simple().to_string();
        format!(
            "{}_{}_{}.xlsx",
            self.file_prefix,
            at.format("%Y%m%d-%H%M%S"),
            &id[..8]
        )
    }
}

fn write_workbook(path: &Path, schema: &FieldSchema, batch: &ExtractionBatch) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Orders")?;

    for (col, field) in schema.fields().iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, field.as_str(), &header)?;
    }
    for (row, record) in batch.iter().enumerate() {
        for (col, field) in schema.fields().iter().enumerate() {
            let value = record.get(field).unwrap_or(schema.sentinel());
            sheet.write_string(row as u32 + 1, col as u16, value)?;
        }
    }
    sheet.autofit();

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook {}", path.display()))
}

#[async_trait]
impl PersistenceSink for XlsxSink {
    async fn persist(&self, request_id: Uuid, batch: &ExtractionBatch) -> Result<ArtifactHandle> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;

        let created_at = Utc::now();
        let file_name = self.file_name(request_id, created_at);
        let path = self.output_dir.join(&file_name);

        let schema = self.schema.clone();
        let rows = batch.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_workbook(&target, &schema, &rows))
            .await
            .context("Spreadsheet writer task panicked")??;

        info!(%request_id, path = %path.display(), records = batch.len(), "Wrote spreadsheet");

        Ok(ArtifactHandle {
            request_id,
            path,
            file_name,
            created_at,
            record_count: batch.len(),
        })
    }
}
