use std::collections::HashSet;

use bytes::Bytes;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::error::SchemaError;

/// Placeholder written for any field the model left out or left empty.
pub const DEFAULT_SENTINEL: &str = "unknown";

/// Canonical order fields, in output column order.
pub const ORDER_FIELDS: [&str; 9] = [
    "product",
    "quantity",
    "shipping_address",
    "customer_name",
    "phone",
    "company",
    "delivery_date",
    "payment_terms",
    "remarks",
];

/// One object as it came out of the model, before completion.
pub type RawRecord = Map<String, Value>;

/// The fixed record shape every output record is forced into.
///
/// Always has at least one distinct, non-blank field and a non-blank
/// sentinel, so completed records never carry an empty value.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldSchema {
    fields: Vec<String>,
    sentinel: String,
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self {
            fields: ORDER_FIELDS.iter().map(|f| f.to_string()).collect(),
            sentinel: DEFAULT_SENTINEL.to_string(),
        }
    }
}

impl FieldSchema {
    pub fn new(fields: Vec<String>, sentinel: impl Into<String>) -> Result<Self, SchemaError> {
        let sentinel = sentinel.into();
        if fields.is_empty() {
            return Err(SchemaError::NoFields);
        }
        if sentinel.trim().is_empty() {
            return Err(SchemaError::BlankSentinel);
        }
        let mut seen = HashSet::new();
        for field in &fields {
            if field.trim().is_empty() {
                return Err(SchemaError::BlankField);
            }
            if !seen.insert(field.as_str()) {
                return Err(SchemaError::DuplicateField(field.clone()));
            }
        }
        Ok(Self { fields, sentinel })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f == key)
    }
}

/// A completed order record: every schema field present, in schema order.
///
/// Serializes as a flat JSON object whose key order matches the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    fields: Vec<(String, String)>,
}

impl OrderRecord {
    pub(crate) fn from_fields(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Back to a raw mapping, e.g. to run it through a completer again.
    pub fn to_raw(&self) -> RawRecord {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }
}

impl Serialize for OrderRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Records produced by one request, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ExtractionBatch {
    records: Vec<OrderRecord>,
}

impl ExtractionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: OrderRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[OrderRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OrderRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<OrderRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<OrderRecord>> for ExtractionBatch {
    fn from(records: Vec<OrderRecord>) -> Self {
        Self { records }
    }
}

impl Extend<OrderRecord> for ExtractionBatch {
    fn extend<I: IntoIterator<Item = OrderRecord>>(&mut self, iter: I) {
        self.records.extend(iter);
    }
}

impl<'a> IntoIterator for &'a ExtractionBatch {
    type Item = &'a OrderRecord;
    type IntoIter = std::slice::Iter<'a, OrderRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Image bytes handed to a vision-capable backend.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub data: Bytes,
    pub mime_type: String,
}

impl ImageInput {
    pub fn new(data: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> OrderRecord {
        OrderRecord::from_fields(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn default_schema_has_nine_fields() {
        let schema = FieldSchema::default();
        assert_eq!(schema.fields.len(), 9);
        assert_eq!(schema.sentinel, "unknown");
        assert!(schema.contains("payment_terms"));
        assert!(!schema.contains("price"));
    }

    #[test]
    fn schema_rejects_blank_sentinel() {
        let fields = vec!["product".to_string(), "phone".to_string()];
        assert_eq!(FieldSchema::new(fields.clone(), ""), Err(SchemaError::BlankSentinel));
        assert_eq!(FieldSchema::new(fields, "  "), Err(SchemaError::BlankSentinel));
    }

    #[test]
    fn schema_rejects_bad_field_lists() {
        assert_eq!(FieldSchema::new(vec![], "-"), Err(SchemaError::NoFields));
        assert_eq!(
            FieldSchema::new(vec!["sku".into(), " ".into()], "-"),
            Err(SchemaError::BlankField)
        );
        assert_eq!(
            FieldSchema::new(vec!["sku".into(), "sku".into()], "-"),
            Err(SchemaError::DuplicateField("sku".into()))
        );
    }

    #[test]
    fn order_record_serializes_in_field_order() {
        let rec = record(&[("quantity", "2"), ("product", "Tea")]);
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(json, r#"{"quantity":"2","product":"Tea"}"#);
    }

    #[test]
    fn batch_serializes_as_plain_array() {
        let mut batch = ExtractionBatch::new();
        batch.push(record(&[("product", "Tea")]));
        batch.extend(vec![record(&[("product", "Milk")])]);
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json[0]["product"], "Tea");
        assert_eq!(json[1]["product"], "Milk");
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn to_raw_round_trips_values() {
        let rec = record(&[("product", "Tea")]);
        assert_eq!(rec.to_raw()["product"], "Tea");
        assert_eq!(rec.get("product"), Some("Tea"));
        assert_eq!(rec.get("phone"), None);
    }
}
