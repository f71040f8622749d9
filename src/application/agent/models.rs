use crate::config::{AppConfig, MemoryMode};
use crate::constants::{DEFAULT_MAX_TOOL_ROUNDS, DEFAULT_SYSTEM_PROMPT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationOptions {
    pub model: String,
    pub system_prompt: String,
    /// Tool-execution phases allowed per user message.
    pub max_tool_rounds: usize,
    pub memory: MemoryMode,
}

impl ConversationOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            memory: MemoryMode::default(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut options = Self::new(config.model.clone())
            .with_max_tool_rounds(config.max_tool_rounds)
            .with_memory(config.memory);
        if let Some(prompt) = config.system_prompt.as_deref() {
            options = options.with_system_prompt(prompt);
        }
        options
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_memory(mut self, memory: MemoryMode) -> Self {
        self.memory = memory;
        self
    }
}
