//! Record completer: forces a raw mapping into the canonical field schema.

use serde_json::Value;

use crate::types::{FieldSchema, OrderRecord, RawRecord};

/// Fills every schema field, substituting the sentinel for missing or empty
/// values and dropping keys the schema does not know.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordCompleter {
    schema: FieldSchema,
}

impl RecordCompleter {
    pub fn new(schema: FieldSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Complete one raw mapping. Total over any input.
    pub fn complete(&self, raw: &RawRecord) -> OrderRecord {
        let fields = self
            .schema
            .fields()
            .iter()
            .map(|key| {
                let value = raw
                    .get(key)
                    .and_then(present_value)
                    .unwrap_or_else(|| self.schema.sentinel().to_string());
                (key.clone(), value)
            })
            .collect();
        OrderRecord::from_fields(fields)
    }

    pub fn complete_all<I>(&self, raws: I) -> Vec<OrderRecord>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        raws.into_iter().map(|raw| self.complete(&raw)).collect()
    }
}

/// A value worth keeping, as a string. Falsy values (null, false, zero,
/// empty strings, empty arrays or objects) count as missing.
fn present_value(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) if items.is_empty() => None,
        Value::Object(map) if map.is_empty() => None,
        other => Some(other.to_string()),
    }
}
