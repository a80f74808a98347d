//! Prompt templates sent to the generative backend.
//!
//! Placeholders: `{schema}` (a JSON example with every field), `{sentinel}`,
//! and, for text prompts only, `{message}`.

use crate::types::FieldSchema;

pub const DEFAULT_TEXT_TEMPLATE: &str = r#"You are a structured data assistant. Extract all order items and customer details from the message below. The message may contain several products.

Extraction rules:
- Return one row per product, even when products are listed together.
- "product": only the product name, never the quantity or unit.
- "quantity": both the number and the unit (e.g. "10 packs", "2 bottles").
- "delivery_date": a specific calendar date such as "25th July 2025", never "Monday" or "tomorrow".
- If a field is not present in the message, use the value "{sentinel}".

Return only a JSON array shaped like this:
{schema}

Extract from:
{message}
"#;

pub const DEFAULT_IMAGE_TEMPLATE: &str = r#"You are an intelligent assistant. Extract all order items and customer details from the attached order document (fax, photo, or scan).

Extraction rules:
- Return one row per product, even when products are listed together.
- "product": only the product name, never the quantity or unit.
- "quantity": both the number and the unit (e.g. "4 bottles").
- "delivery_date": a specific calendar date such as "25th July 2025", never "next week" or "tomorrow".
- If a field is not present in the document, use the value "{sentinel}".

Return only a JSON array shaped like this:
{schema}
"#;

/// Renders extraction prompts for a field schema.
#[derive(Debug, Clone)]
pub struct PromptSet {
    text_template: String,
    image_template: String,
    schema: FieldSchema,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::new(FieldSchema::default())
    }
}

impl PromptSet {
    pub fn new(schema: FieldSchema) -> Self {
        Self {
            text_template: DEFAULT_TEXT_TEMPLATE.to_string(),
            image_template: DEFAULT_IMAGE_TEMPLATE.to_string(),
            schema,
        }
    }

    pub fn with_text_template(mut self, template: impl Into<String>) -> Self {
        self.text_template = template.into();
        self
    }

    pub fn with_image_template(mut self, template: impl Into<String>) -> Self {
        self.image_template = template.into();
        self
    }

    /// Prompt for extracting orders from a free-text message.
    pub fn text_prompt(&self, message: &str) -> String {
        // The message goes in last so braces inside it are never re-expanded.
        self.fill(&self.text_template)
            .replace("{message}", message.trim())
    }

    /// Prompt for extracting orders from an attached image.
    pub fn image_prompt(&self) -> String {
        self.fill(&self.image_template)
    }

    fn fill(&self, template: &str) -> String {
        template
            .replace("{schema}", &schema_example(&self.schema))
            .replace("{sentinel}", self.schema.sentinel())
    }
}

fn schema_example(schema: &FieldSchema) -> String {
    let body = schema
        .fields()
        .iter()
        .map(|field| format!("    \"{field}\": \"...\""))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("[\n  {{\n{body}\n  }}\n]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_prompt_embeds_message_and_every_field() {
        let prompts = PromptSet::default();
        let prompt = prompts.text_prompt("  Send 10 packs of Parle-G to Chennai  ");
        assert!(prompt.contains("Extract from:\nSend 10 packs of Parle-G to Chennai"));
        for field in FieldSchema::default().fields() {
            assert!(prompt.contains(&format!("\"{field}\": \"...\"")), "{field}");
        }
        assert!(prompt.contains("use the value \"unknown\""));
        assert!(!prompt.contains("{schema}"));
    }

    #[test]
    fn message_braces_are_left_alone() {
        let prompts = PromptSet::default();
        let prompt = prompts.text_prompt("note: {sentinel} {schema}");
        assert!(prompt.ends_with("note: {sentinel} {schema}\n"));
    }

    #[test]
    fn image_prompt_uses_custom_sentinel() {
        let prompts = PromptSet::new(FieldSchema::new(vec!["sku".into()], "N/A").unwrap());
        let prompt = prompts.image_prompt();
        assert!(prompt.contains("\"N/A\""));
        assert!(prompt.contains("\"sku\": \"...\""));
        assert!(!prompt.contains("{message}"));
    }

    #[test]
    fn custom_template_overrides_default() {
        let prompts = PromptSet::default().with_text_template("Orders in: {message}");
        assert_eq!(prompts.text_prompt("2 tea"), "Orders in: 2 tea");
    }
}
