pub mod tool;
pub mod types;

pub use tool::{ToolCallResult, ToolDescriptor};
pub use types::{ChatMessage, MessageRole, ToolInvocation};
