pub mod app;
pub mod error;
pub mod loader;
pub mod ollama;
pub mod server;

pub use crate::constants::CONFIG_PATH;

pub use app::{AppConfig, MemoryMode};
pub use error::ConfigError;
pub use ollama::OllamaConfig;
pub use server::ServerConfig;
