use crate::application::agent::{Conversation, ConversationError, ConversationOptions};
use crate::application::tooling::{DescriptionHints, DiagnosticSink, RpcClient, RpcError, ToolCatalog};
use crate::config::{AppConfig, ConfigError};
use crate::infrastructure::model::{ModelError, ModelProvider, OllamaClient};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl SessionError {
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Config(err) => err.user_message(),
            SessionError::Rpc(err) => err.user_message(),
            SessionError::Model(err) => err.user_message(),
        }
    }
}

/// One tool server process plus the conversation that uses it.
pub struct ChatSession<P: ModelProvider> {
    client: Arc<RpcClient>,
    conversation: Conversation<P>,
    closed: bool,
}

impl ChatSession<OllamaClient> {
    pub async fn from_config(
        config: &AppConfig,
        diagnostics: Option<DiagnosticSink>,
    ) -> Result<Self, SessionError> {
        let provider = OllamaClient::from_config(&config.ollama)?;
        info!(endpoint = provider.endpoint(), model = config.model.as_str(), "Using Ollama");
        Self::start(provider, config, diagnostics).await
    }
}

impl<P: ModelProvider> ChatSession<P> {
    /// Starts the tool server, waits for its catalog and builds the conversation.
    pub async fn start(
        provider: P,
        config: &AppConfig,
        diagnostics: Option<DiagnosticSink>,
    ) -> Result<Self, SessionError> {
        let (client, discovered) = RpcClient::connect(config.server.clone(), diagnostics).await?;
        let catalog = discovered.enrich(&DescriptionHints::new(config.descriptions.clone()));
        info!(tools = ?catalog.names(), "Tool catalog ready");

        let client = Arc::new(client);
        let conversation = Conversation::new(provider, ConversationOptions::from_config(config))
            .with_tools(client.clone(), catalog);

        Ok(Self {
            client,
            conversation,
            closed: false,
        })
    }

    pub async fn ask(&mut self, message: impl Into<String>) -> Result<String, ConversationError> {
        self.conversation.ask(message).await
    }

    pub fn catalog(&self) -> &ToolCatalog {
        self.conversation.catalog()
    }

    pub fn conversation_mut(&mut self) -> &mut Conversation<P> {
        &mut self.conversation
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.client
    }

    /// Stops the tool server. Later calls do nothing.
    pub async fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.client.shutdown().await;
        info!(server = self.client.server_name(), "Session closed");
    }
}
