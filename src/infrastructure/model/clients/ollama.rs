//! Ollama client implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::base::HttpClientBase;
use crate::config::OllamaConfig;
use crate::domain::{ChatMessage, MessageRole, ToolDescriptor, ToolInvocation};
use crate::infrastructure::model::traits::ModelProvider;
use crate::infrastructure::model::types::{ModelError, ModelRequest, ModelResponse};

/// Ollama `/api/chat` client
#[derive(Clone)]
pub struct OllamaClient {
    base: HttpClientBase,
}

impl OllamaClient {
    pub fn from_config(config: &OllamaConfig) -> Result<Self, ModelError> {
        Ok(Self {
            base: HttpClientBase::new(config.endpoint.clone(), config.timeout)?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.base.endpoint
    }
}

#[async_trait]
impl ModelProvider for OllamaClient {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let url = self.base.build_url("/api/chat");
        let payload = OllamaRequest::from(&request);

        info!(
            model = request.model.as_str(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending request to Ollama"
        );

        let response: OllamaResponse = self.base.post_no_auth(&url, &payload).await?;
        debug!("Received response from Ollama");

        let message = response
            .message
            .ok_or_else(|| ModelError::invalid_response("missing message"))?;

        Ok(ModelResponse::new(message.into_domain()?))
    }
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OllamaTool<'a>>,
}

impl<'a> From<&'a ModelRequest> for OllamaRequest<'a> {
    fn from(request: &'a ModelRequest) -> Self {
        Self {
            model: &request.model,
            messages: request.messages.iter().map(OllamaMessage::from).collect(),
            stream: false,
            tools: request.tools.iter().map(OllamaTool::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OllamaToolCall>,
}

impl From<&ChatMessage> for OllamaMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role.as_str(),
            content: message.content.clone(),
            tool_calls: message
                .tool_calls
                .iter()
                .map(|call| OllamaToolCall {
                    function: OllamaFunctionCall {
                        name: call.name.clone(),
                        arguments: Value::Object(call.arguments.clone()),
                    },
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Serialize)]
struct OllamaTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OllamaFunction<'a>,
}

#[derive(Debug, Serialize)]
struct OllamaFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

impl<'a> From<&'a ToolDescriptor> for OllamaTool<'a> {
    fn from(tool: &'a ToolDescriptor) -> Self {
        Self {
            kind: "function",
            function: OllamaFunction {
                name: &tool.name,
                description: &tool.description,
                parameters: &tool.input_schema,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: Option<OllamaResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

impl OllamaResponseMessage {
    fn into_domain(self) -> Result<ChatMessage, ModelError> {
        if let Some(role) = self.role.as_deref() {
            if MessageRole::parse(role) != Some(MessageRole::Assistant) {
                debug!(role, "Ollama replied with a non-assistant role; treating as assistant");
            }
        }

        let tool_calls = self
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                let arguments = ToolInvocation::parse_arguments(call.function.arguments)
                    .map_err(ModelError::invalid_response)?;
                Ok(ToolInvocation::new(call.function.name, arguments))
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        Ok(ChatMessage::assistant(self.content.unwrap_or_default()).with_tool_calls(tool_calls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_request() -> ModelRequest {
        let mut args = serde_json::Map::new();
        args.insert("city".into(), json!("Recife"));
        ModelRequest {
            model: "llama3.2".into(),
            messages: vec![
                ChatMessage::system("stay concise"),
                ChatMessage::user("hi"),
                ChatMessage::assistant("").with_tool_calls(vec![ToolInvocation::new("lookup", args)]),
                ChatMessage::tool("result text"),
            ],
            tools: vec![ToolDescriptor::new(
                "gettime",
                "Current time",
                json!({"type": "object", "properties": {}}),
            )],
        }
    }

    #[test]
    fn request_conversion_matches_chat_wire_format() {
        let request = sample_request();
        let payload = serde_json::to_value(OllamaRequest::from(&request)).expect("serialize");

        assert_eq!(payload["model"], "llama3.2");
        assert_eq!(payload["stream"], false);
        let roles: Vec<_> = payload["messages"]
            .as_array()
            .expect("messages")
            .iter()
            .map(|m| m["role"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "tool"]);
        assert_eq!(
            payload["messages"][2]["tool_calls"][0],
            json!({"function": {"name": "lookup", "arguments": {"city": "Recife"}}})
        );
        assert!(payload["messages"][1].get("tool_calls").is_none());
        assert_eq!(
            payload["tools"][0],
            json!({
                "type": "function",
                "function": {
                    "name": "gettime",
                    "description": "Current time",
                    "parameters": {"type": "object", "properties": {}}
                }
            })
        );
    }

    #[test]
    fn tools_are_omitted_when_catalog_is_empty() {
        let mut request = sample_request();
        request.tools.clear();
        let payload = serde_json::to_value(OllamaRequest::from(&request)).expect("serialize");
        assert!(payload.get("tools").is_none());
    }

    #[test]
    fn response_with_tool_calls_maps_to_invocations() {
        let response: OllamaResponse = serde_json::from_value(json!({
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    {"function": {"name": "gettime"}},
                    {"function": {"name": "lookup", "arguments": {"city": "Lisbon"}}}
                ]
            }
        }))
        .expect("parse");

        let message = response.message.expect("message").into_domain().expect("domain");
        assert_eq!(message.role, MessageRole::Assistant);
        assert_eq!(message.tool_calls.len(), 2);
        assert!(message.tool_calls[0].arguments.is_empty());
        assert_eq!(message.tool_calls[1].arguments.get("city"), Some(&json!("Lisbon")));
    }

    #[test]
    fn null_content_becomes_empty_string() {
        let response: OllamaResponse =
            serde_json::from_value(json!({"message": {"role": "assistant", "content": null}}))
                .expect("parse");
        let message = response.message.expect("message").into_domain().expect("domain");
        assert_eq!(message.content, "");
        assert!(!message.requests_tools());
    }

    #[test]
    fn malformed_arguments_are_invalid_response() {
        let response: OllamaResponse = serde_json::from_value(json!({
            "message": {"role": "assistant", "content": "", "tool_calls": [
                {"function": {"name": "x", "arguments": 42}}
            ]}
        }))
        .expect("parse");
        let err = response.message.expect("message").into_domain().unwrap_err();
        assert!(matches!(err, ModelError::InvalidResponse { .. }));
    }
}
