//! Model infrastructure module
//!
//! # Structure
//! - `types` - Request, Response, Error types
//! - `traits` - the `ModelProvider` seam the conversation loop talks to
//! - `clients` - HTTP client implementations

pub mod clients;
pub mod traits;
pub mod types;

pub use clients::OllamaClient;
pub use traits::ModelProvider;
pub use types::{ModelError, ModelRequest, ModelResponse};
