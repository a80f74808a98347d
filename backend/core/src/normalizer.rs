//! Response normalizer: reduces loosely formatted model output to a list of
//! raw JSON objects.
//!
//! Generative models wrap JSON in code fences, surround it with prose, or use
//! single quotes. The steps below run in order, each assuming the previous one
//! ran:
//!
//! 1. trim surrounding whitespace
//! 2. strip a leading ```` ``` ```` fence and its language tag
//! 3. keep the first `[` through the last `]`
//! 4. parse; on a syntax error, swap `'` for `"` and parse again
//!
//! Step 4 tries the text as-is first so that well-formed JSON containing
//! apostrophes survives. A single-quoted payload that also has apostrophes
//! inside values is still corrupted by the swap and reported as invalid.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::FormatError;
use crate::types::RawRecord;

/// Greedy, multi-line: first `[` through the last `]`.
static ARRAY_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*\]").unwrap());

/// Result of normalizing one model response.
///
/// Never an `Err`: on failure `records` is empty and `error` says why.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub records: Vec<RawRecord>,
    pub error: Option<FormatError>,
}

impl Normalized {
    fn parsed(records: Vec<RawRecord>) -> Self {
        Self {
            records,
            error: None,
        }
    }

    fn failed(error: FormatError) -> Self {
        Self {
            records: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Vec<RawRecord>, FormatError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.records),
        }
    }
}

/// Normalize raw model output into raw records.
pub fn normalize(raw: &str) -> Normalized {
    let text = strip_code_fence(raw.trim());

    let Some(span) = find_array_span(text) else {
        return Normalized::failed(FormatError::NoArrayFound {
            raw_output: raw.to_string(),
        });
    };

    let first_error = match parse_records(span) {
        Ok(records) => return Normalized::parsed(records),
        Err(err) => err,
    };

    // Valid JSON of the wrong shape gains nothing from a quote swap.
    if matches!(first_error, ParseFailure::Shape(_)) || !span.contains('\'') {
        return Normalized::failed(FormatError::InvalidJson {
            raw_output: raw.to_string(),
            message: first_error.into_message(),
        });
    }

    match parse_records(&span.replace('\'', "\"")) {
        Ok(records) => Normalized::parsed(records),
        Err(err) => Normalized::failed(FormatError::InvalidJson {
            raw_output: raw.to_string(),
            message: err.into_message(),
        }),
    }
}

/// Strip a leading code fence, its language tag, and any closing fence.
///
/// Text that does not start with a fence is returned unchanged.
pub fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.trim_start_matches('`');

    // A language tag is a bare word glued to the fence, e.g. "json" or "JSON".
    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(rest.len());
    let rest = &rest[tag_len..];

    rest.trim().trim_end_matches('`').trim_end()
}

/// The first `[` through the last `]`, or `None` when there is no such span.
pub fn find_array_span(text: &str) -> Option<&str> {
    ARRAY_SPAN.find(text).map(|m| m.as_str())
}

/// Why a span did not parse: bad JSON syntax, or valid JSON of the wrong shape.
enum ParseFailure {
    Syntax(String),
    Shape(String),
}

impl ParseFailure {
    fn into_message(self) -> String {
        match self {
            ParseFailure::Syntax(m) | ParseFailure::Shape(m) => m,
        }
    }
}

fn parse_records(span: &str) -> Result<Vec<RawRecord>, ParseFailure> {
    let value: Value =
        serde_json::from_str(span).map_err(|e| ParseFailure::Syntax(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(ParseFailure::Shape("expected a JSON array".to_string()));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(ParseFailure::Shape(format!(
                "element {index} is {}, expected an object",
                json_kind(&other)
            ))),
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
