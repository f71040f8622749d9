//! Application constants
//!
//! Single source of truth for paths, defaults and fixed prompt text.

/// Default configuration file path
pub const CONFIG_PATH: &str = "config/client.toml";

/// Default environment file path
pub const ENV_PATH: &str = "config/.env";

pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_STARTUP_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;

/// Returned when the model finishes without any text.
pub const NO_FINAL_ANSWER: &str = "(no final answer from the model)";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Important rules about tools:

1. Use tools ONLY when the user explicitly asks for information that a tool provides.
2. For greetings or casual conversation, NEVER use tools; answer directly.
3. The 'gettime' tool must be used ONLY when the user asks things like \"what time is it?\", \"what is the date?\" or \"tell me the time\".
4. If you are not sure, prefer NOT to use a tool and answer normally.

Remember: tools have a computational cost. Use them wisely.";
