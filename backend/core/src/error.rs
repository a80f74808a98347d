use thiserror::Error;

/// The model's text could not be reduced to a parseable array of objects.
///
/// Both variants keep the untouched model output so callers can report it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("no JSON array found in model output")]
    NoArrayFound { raw_output: String },

    #[error("model output is not a JSON array of objects: {message}")]
    InvalidJson { raw_output: String, message: String },
}

impl FormatError {
    /// The raw text the model returned.
    pub fn raw_output(&self) -> &str {
        match self {
            FormatError::NoArrayFound { raw_output } => raw_output,
            FormatError::InvalidJson { raw_output, .. } => raw_output,
        }
    }
}

/// A field schema that could not produce well-formed records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("schema needs at least one field")]
    NoFields,

    #[error("schema field names cannot be blank")]
    BlankField,

    #[error("duplicate schema field \"{0}\"")]
    DuplicateField(String),

    #[error("schema sentinel must be a non-blank string")]
    BlankSentinel,
}

/// Failure of one extraction request.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no input messages supplied")]
    EmptyRequest,

    #[error("backend {backend} cannot read images")]
    ImagesUnsupported { backend: String },

    #[error("invalid format received from model: {0}")]
    Format(#[from] FormatError),

    #[error("generative backend {backend} unavailable: {message}")]
    Unavailable { backend: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_output_is_kept_for_both_variants() {
        let a = FormatError::NoArrayFound {
            raw_output: "nope".into(),
        };
        let b = FormatError::InvalidJson {
            raw_output: "[oops]".into(),
            message: "expected value".into(),
        };
        assert_eq!(a.raw_output(), "nope");
        assert_eq!(b.raw_output(), "[oops]");
        assert!(b.to_string().contains("expected value"));
    }

    #[test]
    fn format_error_converts_into_extract_error() {
        let err: ExtractError = FormatError::NoArrayFound {
            raw_output: String::new(),
        }
        .into();
        assert!(matches!(err, ExtractError::Format(_)));
    }
}
