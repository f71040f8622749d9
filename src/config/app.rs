use super::error::ConfigError;
use super::ollama::OllamaConfig;
use super::server::ServerConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Whether conversation history survives between user messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryMode {
    /// History accumulates for the whole session.
    #[default]
    Session,
    /// Every user message starts from the system instruction alone.
    PerMessage,
}

/// Application configuration loaded from client.toml
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: String,
    pub system_prompt: Option<String>,
    pub max_tool_rounds: usize,
    pub memory: MemoryMode,
    pub ollama: OllamaConfig,
    pub server: ServerConfig,
    /// Tool name → description used when the server leaves it empty.
    pub descriptions: BTreeMap<String, String>,
}

impl AppConfig {
    /// Load configuration from a file path (or default path if None)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }
}
