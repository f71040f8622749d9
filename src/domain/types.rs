use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "system" => Some(MessageRole::System),
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            "tool" => Some(MessageRole::Tool),
            _ => None,
        }
    }
}

/// A tool the model asked to run, as parsed out of an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Decodes the `arguments` value a model attached to a tool call.
    ///
    /// Absent or null arguments become an empty map. Some models send the object
    /// string-encoded, so a string holding a JSON object is accepted too.
    pub fn parse_arguments(raw: Value) -> Result<Map<String, Value>, String> {
        match raw {
            Value::Null => Ok(Map::new()),
            Value::Object(map) => Ok(map),
            Value::String(text) if text.trim().is_empty() => Ok(Map::new()),
            Value::String(text) => serde_json::from_str::<Map<String, Value>>(&text)
                .map_err(|err| format!("tool arguments are not a JSON object: {err}")),
            other => Err(format!("tool arguments must be an object, got {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    /// Only ever populated on assistant messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocation>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Tool, content)
    }

    pub fn with_tool_calls(mut self, calls: Vec<ToolInvocation>) -> Self {
        self.tool_calls = calls;
        self
    }

    pub fn requests_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_round_trips_through_str() {
        for role in [
            MessageRole::System,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::Tool,
        ] {
            assert_eq!(MessageRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(MessageRole::parse("developer"), None);
    }

    #[test]
    fn arguments_default_to_empty_map() {
        assert!(ToolInvocation::parse_arguments(Value::Null).expect("null").is_empty());
        assert!(ToolInvocation::parse_arguments(json!("  ")).expect("blank").is_empty());
    }

    #[test]
    fn string_encoded_arguments_are_decoded() {
        let args = ToolInvocation::parse_arguments(json!(r#"{"city":"Recife"}"#)).expect("decode");
        assert_eq!(args.get("city"), Some(&json!("Recife")));
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        assert!(ToolInvocation::parse_arguments(json!([1, 2])).is_err());
        assert!(ToolInvocation::parse_arguments(json!("[1]")).is_err());
    }

    #[test]
    fn plain_message_omits_tool_calls() {
        let value = serde_json::to_value(ChatMessage::user("hi")).expect("serialize");
        assert_eq!(value, json!({"role": "user", "content": "hi"}));
    }
}
