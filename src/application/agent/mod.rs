//! # Conversation Module
//!
//! Drives one chat with the model and lets it call tools along the way.
//!
//! ## Loop
//!
//! 1. Send the history and the tool schemas to the model
//! 2. If the reply asks for tools, run each one in order and append its text
//! 3. Repeat until the reply carries no tool calls; its content is the answer

mod errors;
mod models;
mod runner;


pub use errors::ConversationError;
pub use models::ConversationOptions;
pub use runner::Conversation;
