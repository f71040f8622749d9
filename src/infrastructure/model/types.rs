//! Model types - Request, Response, and Error types

use crate::domain::{ChatMessage, ToolDescriptor};
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Model request for LLM chat
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDescriptor>,
}

/// Model response from LLM
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub message: ChatMessage,
}

impl ModelResponse {
    pub fn new(message: ChatMessage) -> Self {
        Self { message }
    }
}

/// Model errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("network error calling the chat endpoint: {source}")]
    Network {
        #[source]
        source: reqwest::Error,
    },
    #[error("chat request timed out after {}s", timeout.as_secs())]
    Timeout { timeout: Duration },
    #[error("chat endpoint returned status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("chat endpoint returned invalid response: {reason}")]
    InvalidResponse { reason: String },
}

impl ModelError {
    pub fn network(source: reqwest::Error) -> Self {
        Self::Network { source }
    }

    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ModelError::Network { source } => {
                if source.is_connect() {
                    "Could not connect to the model server. Make sure Ollama is running and reachable."
                        .to_string()
                } else {
                    "Network error while talking to the model server. Try again shortly.".to_string()
                }
            }
            ModelError::Timeout { timeout } => format!(
                "The model did not answer within {}s. Try again or raise ollama.timeout_secs.",
                timeout.as_secs()
            ),
            ModelError::Status { status, .. } => match *status {
                StatusCode::NOT_FOUND => {
                    "Chat endpoint not found (404). Check that the server exposes /api/chat and the model is pulled."
                        .to_string()
                }
                StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                    "The model server is unavailable right now. Try again later.".to_string()
                }
                other => format!("The chat request failed with status {}.", other.as_u16()),
            },
            ModelError::InvalidResponse { .. } => {
                "The model server sent a response that could not be processed.".to_string()
            }
        }
    }
}
