//! `orderiq-core`: the record schema and the tolerant parsing boundary between
//! free text returned by a generative model and checkable order records.

pub mod completer;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod prompt;
pub mod traits;
pub mod types;

pub use completer::RecordCompleter;
pub use error::{ExtractError, FormatError, SchemaError};
pub use normalizer::{normalize, Normalized};
pub use pipeline::ExtractionPipeline;
pub use prompt::PromptSet;
pub use traits::{GenerativeBackend, Generation, GenerationRequest};
pub use types::{
    ExtractionBatch, FieldSchema, ImageInput, OrderRecord, RawRecord, DEFAULT_SENTINEL,
    ORDER_FIELDS,
};
