use super::errors::ConversationError;
use super::models::ConversationOptions;
use crate::application::tooling::{ToolCatalog, ToolInvoker};
use crate::config::MemoryMode;
use crate::constants::NO_FINAL_ANSWER;
use crate::domain::ChatMessage;
use crate::infrastructure::model::{ModelProvider, ModelRequest};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Conversation<P: ModelProvider> {
    provider: P,
    tools: Option<Arc<dyn ToolInvoker>>,
    catalog: ToolCatalog,
    options: ConversationOptions,
    history: Vec<ChatMessage>,
}

impl<P: ModelProvider> Conversation<P> {
    /// A conversation without tools. Any tool call from the model fails the turn.
    pub fn new(provider: P, options: ConversationOptions) -> Self {
        let history = vec![ChatMessage::system(options.system_prompt.clone())];
        Self {
            provider,
            tools: None,
            catalog: ToolCatalog::default(),
            options,
            history,
        }
    }

    pub fn with_tools(mut self, invoker: Arc<dyn ToolInvoker>, catalog: ToolCatalog) -> Self {
        self.tools = Some(invoker);
        self.catalog = catalog;
        self
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn options(&self) -> &ConversationOptions {
        &self.options
    }

    /// Drops everything but the system instruction.
    pub fn reset(&mut self) {
        self.history.truncate(1);
    }

    /// Runs one user message to a final answer.
    ///
    /// On error the history is restored to what it was before `message` was
    /// added, so the next message continues from the last completed exchange.
    pub async fn ask(&mut self, message: impl Into<String>) -> Result<String, ConversationError> {
        if self.options.memory == MemoryMode::PerMessage {
            self.reset();
        }

        let checkpoint = self.history.len();
        self.history.push(ChatMessage::user(message));

        match self.run_turns().await {
            Ok(answer) => Ok(answer),
            Err(err) => {
                warn!(%err, "Conversation turn failed; discarding partial history");
                self.history.truncate(checkpoint);
                Err(err)
            }
        }
    }

    async fn run_turns(&mut self) -> Result<String, ConversationError> {
        let mut rounds = 0usize;

        loop {
            let request = ModelRequest {
                model: self.options.model.clone(),
                messages: self.history.clone(),
                tools: self.catalog.as_slice().to_vec(),
            };
            debug!(rounds, messages = request.messages.len(), "Asking model");

            let reply = self.provider.chat(request).await?.message;
            let calls = reply.tool_calls.clone();
            let content = reply.content.clone();
            self.history.push(reply);

            if calls.is_empty() {
                info!(rounds, "Model returned final answer");
                if content.trim().is_empty() {
                    return Ok(NO_FINAL_ANSWER.to_string());
                }
                return Ok(content);
            }

            let Some(tools) = self.tools.clone() else {
                warn!(requested = calls.len(), "Model requested tools without a tool server");
                return Err(ConversationError::ToolsUnavailable);
            };

            if rounds >= self.options.max_tool_rounds {
                warn!(
                    limit = self.options.max_tool_rounds,
                    "Model exceeded the tool round limit"
                );
                return Err(ConversationError::TooManyIterations {
                    limit: self.options.max_tool_rounds,
                });
            }
            rounds += 1;

            for call in calls {
                info!(tool = call.name.as_str(), "Executing tool");
                let result = tools.call_tool(&call.name, call.arguments).await?;
                debug!(tool = call.name.as_str(), chars = result.text().len(), "Tool finished");
                self.history.push(ChatMessage::tool(result.into_text()));
            }
        }
    }
}
