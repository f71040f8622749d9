use crate::constants::{DEFAULT_OLLAMA_ENDPOINT, DEFAULT_OLLAMA_TIMEOUT_SECS};
use serde::Deserialize;
use std::time::Duration;

/// Where the chat endpoint lives and how long a single chat call may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OLLAMA_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_OLLAMA_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawOllama {
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
}
