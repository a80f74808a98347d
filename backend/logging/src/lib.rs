//! Tracing setup and log hygiene for OrderIQ.
//!
//! Handles console/NDJSON output, daily file rotation, redaction of phone numbers
//! and credentials, and the per-request extraction audit trail.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogEntry, EventLogger, ExtractionEvent};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
