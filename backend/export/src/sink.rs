use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use orderiq_core::ExtractionBatch;

/// A persisted batch on disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactHandle {
    pub request_id: Uuid,
    pub path: PathBuf,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub record_count: usize,
}

/// Writes a batch somewhere a user can later download it from.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn persist(
        &self,
        request_id: Uuid,
        batch: &ExtractionBatch,
    ) -> anyhow::Result<ArtifactHandle>;
}
