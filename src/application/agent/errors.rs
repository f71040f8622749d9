use crate::application::tooling::RpcError;
use crate::infrastructure::model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Tool(#[from] RpcError),
    #[error("model requested a tool but no tool server is attached")]
    ToolsUnavailable,
    #[error("model was still requesting tools after {limit} rounds")]
    TooManyIterations { limit: usize },
}

impl ConversationError {
    pub fn user_message(&self) -> String {
        match self {
            ConversationError::Model(err) => err.user_message(),
            ConversationError::Tool(err) => err.user_message(),
            ConversationError::ToolsUnavailable => {
                "The model tried to use a tool, but no tool server is connected.".to_string()
            }
            ConversationError::TooManyIterations { limit } => format!(
                "The model kept calling tools without answering (limit {limit}). Try rephrasing the question."
            ),
        }
    }
}
