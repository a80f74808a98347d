//! Extraction Event Logger
//!
//! One structured entry per extraction milestone, emitted under the
//! `extraction_events` target so it can be filtered into its own NDJSON stream.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtractionEvent {
    Requested {
        source: String,
        inputs: usize,
    },
    Completed {
        records: usize,
        artifact: Option<String>,
    },
    Failed {
        error_msg: String,
        raw_output: Option<String>,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: ExtractionEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Redact and emit one event; returns the entry that was logged.
    pub fn log_event(request_id: &str, mut event: ExtractionEvent) -> EventLogEntry {
        if let ExtractionEvent::Failed {
            error_msg,
            raw_output,
        } = &mut event
        {
            *error_msg = redact_sensitive_data(error_msg);
            if let Some(raw) = raw_output {
                *raw = redact_sensitive_data(raw);
            }
        }

        let entry = EventLogEntry {
            request_id: request_id.into(),
            timestamp: Utc::now(),
            event,
        };

        match serde_json::to_string(&entry) {
            Ok(json) => info!(target: "extraction_events", entry = %json, "Extraction event"),
            Err(_) => info!(target: "extraction_events", entry = ?entry, "Extraction event"),
        }
        entry
    }
}
