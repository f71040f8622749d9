use super::CONFIG_PATH;
use super::app::{AppConfig, MemoryMode};
use super::error::ConfigError;
use super::ollama::{OllamaConfig, RawOllama};
use super::server::RawServer;
use crate::constants::{DEFAULT_MAX_TOOL_ROUNDS, ENV_PATH};
use dotenvy::from_filename;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Once;
use std::time::Duration;
use tracing::debug;

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
pub(super) struct RawConfig {
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub max_tool_rounds: Option<usize>,
    pub memory: Option<MemoryMode>,
    #[serde(default)]
    pub ollama: RawOllama,
    pub server: Option<RawServer>,
    #[serde(default)]
    pub descriptions: BTreeMap<String, String>,
}

/// Ensures environment variables are loaded from config/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename(ENV_PATH);
    });
}

/// Load and validate configuration from a file path
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    let config_path = path.unwrap_or_else(|| Path::new(CONFIG_PATH));
    read_config(config_path)
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading client configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let parsed: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_and_build(parsed)
}

fn validate_and_build(parsed: RawConfig) -> Result<AppConfig, ConfigError> {
    let model = parsed
        .model
        .filter(|m| !m.trim().is_empty())
        .ok_or(ConfigError::MissingModel)?;

    let raw_server = parsed.server.ok_or(ConfigError::MissingServer)?;
    let command = raw_server
        .command
        .clone()
        .filter(|c| !c.trim().is_empty())
        .ok_or(ConfigError::MissingCommand)?;
    if raw_server.startup_timeout_ms == Some(0) {
        return Err(ConfigError::invalid(
            "server.startup_timeout_ms",
            "must be greater than zero",
        ));
    }
    let server = raw_server.into_config(command);

    let max_tool_rounds = parsed.max_tool_rounds.unwrap_or(DEFAULT_MAX_TOOL_ROUNDS);
    if max_tool_rounds == 0 {
        return Err(ConfigError::invalid(
            "max_tool_rounds",
            "must be at least 1",
        ));
    }

    let mut ollama = OllamaConfig::default();
    if let Some(endpoint) = parsed.ollama.endpoint {
        ollama.endpoint = endpoint;
    }
    match parsed.ollama.timeout_secs {
        Some(0) => {
            return Err(ConfigError::invalid(
                "ollama.timeout_secs",
                "must be greater than zero",
            ));
        }
        Some(secs) => ollama.timeout = Duration::from_secs(secs),
        None => {}
    }

    let system_prompt = parsed.system_prompt.filter(|p| !p.trim().is_empty());

    Ok(AppConfig {
        model,
        system_prompt,
        max_tool_rounds,
        memory: parsed.memory.unwrap_or_default(),
        ollama,
        server,
        descriptions: parsed.descriptions,
    })
}
