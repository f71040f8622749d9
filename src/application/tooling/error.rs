use std::time::Duration;
use thiserror::Error;

/// Failures of the raw line channel to the child process.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to spawn tool server '{server}': {source}")]
    Spawn {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tool server '{server}' is not running")]
    NotStarted { server: String },
    #[error("tool server '{server}' did not expose its {stream} pipe")]
    MissingPipe {
        server: String,
        stream: &'static str,
    },
    #[error("tool server '{server}' I/O error: {source}")]
    Io {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tool server '{server}' closed its output")]
    Closed { server: String },
}

/// Failures of a JSON-RPC exchange with the tool server.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("tool server '{server}' sent no response to '{method}'")]
    EmptyResponse { server: String, method: String },
    #[error("tool server '{server}' returned invalid JSON: {source}")]
    InvalidJson {
        server: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode '{method}' request: {source}")]
    Encode {
        method: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("tool server '{server}' returned JSON-RPC error {code}: {message}")]
    Server {
        server: String,
        code: i64,
        message: String,
    },
    #[error("tool server '{server}' returned no result for '{method}'")]
    MissingResult { server: String, method: String },
    #[error("tool server '{server}' did not answer tools/list within {}ms", timeout.as_millis())]
    StartupTimeout { server: String, timeout: Duration },
}

impl RpcError {
    pub fn user_message(&self) -> String {
        match self {
            RpcError::Transport(TransportError::Spawn { server, .. }) => format!(
                "Could not start the tool server '{server}'. Check server.command in the configuration."
            ),
            RpcError::Transport(TransportError::NotStarted { .. }) => {
                "The tool server is not running.".to_string()
            }
            RpcError::Transport(_) | RpcError::EmptyResponse { .. } => {
                "Lost contact with the tool server. Restart the client to reconnect.".to_string()
            }
            RpcError::InvalidJson { .. } | RpcError::MissingResult { .. } => {
                "The tool server sent a reply that could not be understood.".to_string()
            }
            RpcError::Encode { .. } => "The tool request could not be encoded.".to_string(),
            RpcError::Server { message, .. } => format!("The tool reported an error: {message}"),
            RpcError::StartupTimeout { timeout, .. } => format!(
                "The tool server did not become ready within {}ms. Raise server.startup_timeout_ms if it starts slowly.",
                timeout.as_millis()
            ),
        }
    }
}
