//! Tool metadata and tool results as seen by the client.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A tool advertised by the tool server. Identity is `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Schema used when the server does not declare one.
    pub fn empty_schema() -> Value {
        json!({ "type": "object", "properties": {} })
    }

    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }
}

/// Raw `tools/call` result with its flattened text form.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallResult {
    raw: Value,
    text: String,
}

impl ToolCallResult {
    pub fn new(raw: Value) -> Self {
        let text = extract_text(&raw);
        Self { raw, text }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl From<Value> for ToolCallResult {
    fn from(raw: Value) -> Self {
        Self::new(raw)
    }
}

/// Joins the `text` of every `{"type":"text"}` entry in `content` with single spaces.
/// Falls back to the compact JSON of the whole result when there is nothing to join.
pub fn extract_text(raw: &Value) -> String {
    let texts: Vec<&str> = raw
        .get("content")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter(|entry| entry.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|entry| entry.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if texts.is_empty() {
        raw.to_string()
    } else {
        texts.join(" ")
    }
}
