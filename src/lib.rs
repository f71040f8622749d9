pub mod application;
pub mod cli;
pub mod config;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::{agent, session, stdio, tooling};
pub use cli::{Cli, RunMode};
pub use config::AppConfig;
pub use domain::types;
pub use infrastructure::{model, rpc};

use agent::ConversationError;
use config::ConfigError;
use session::{ChatSession, SessionError};
use std::io::IsTerminal;
use std::path::Path;
use stdio::StdioError;
use thiserror::Error;
use tokio::io::{self, AsyncReadExt, BufReader};
use tokio::sync::mpsc;
use tooling::DiagnosticSink;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Conversation(#[from] ConversationError),
    #[error(transparent)]
    Stdio(#[from] StdioError),
    #[error("failed to read prompt from stdin: {0}")]
    Prompt(#[source] std::io::Error),
    #[error("no prompt given")]
    MissingPrompt,
}

impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(err) => err.user_message(),
            AppError::Session(err) => err.user_message(),
            AppError::Conversation(err) => err.user_message(),
            AppError::Stdio(err) => err.to_string(),
            AppError::Prompt(err) => format!("Could not read the prompt from stdin: {err}"),
            AppError::MissingPrompt => {
                "No prompt given. Pass it after the options or pipe it on stdin.".to_string()
            }
        }
    }
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    let quiet_mode = cli.mode == RunMode::Stdio;
    init_tracing(quiet_mode);
    info!("Starting ollama-mcp-client");
    debug!(mode = ?cli.mode, config = ?cli.config, "CLI arguments parsed");

    let config_path = cli.config.as_deref().map(Path::new);
    let mut file_config = AppConfig::load(config_path)?;
    if let Some(path) = config_path {
        info!(path = %path.display(), "Loaded configuration from file");
    } else {
        info!("Loaded configuration from default path");
    }
    apply_cli_overrides(&cli, &mut file_config);

    // Ask mode needs its prompt before a server process is worth starting.
    let prompt = match cli.mode {
        RunMode::Ask => Some(load_prompt(&cli).await?),
        RunMode::Stdio => None,
    };

    let diagnostics = quiet_mode.then(|| console_diagnostics(file_config.server.name.clone()));
    let mut session = ChatSession::from_config(&file_config, diagnostics).await?;

    info!(mode = ?cli.mode, "Running client in selected mode");
    let outcome = match prompt {
        Some(prompt) => match session.ask(prompt).await {
            Ok(answer) => {
                println!("{answer}");
                Ok(())
            }
            Err(err) => Err(AppError::from(err)),
        },
        None => {
            print_banner(&session);
            let conversation = session.conversation_mut();
            stdio::run(conversation, BufReader::new(io::stdin()), io::stdout())
                .await
                .map_err(AppError::from)
        }
    };

    session.shutdown().await;
    info!("Client execution finished");
    outcome
}

fn init_tracing(quiet: bool) {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = if quiet {
            EnvFilter::new("off")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        };
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .init();
    });
}

fn apply_cli_overrides(cli: &Cli, config: &mut AppConfig) {
    if let Some(url) = &cli.ollama_url {
        info!(url = url.as_str(), "Overriding Ollama endpoint based on CLI flag");
        config.ollama.endpoint = url.clone();
    }
    if let Some(model) = &cli.model {
        info!(model = model.as_str(), "Overriding model based on CLI flag");
        config.model = model.clone();
    }
}

async fn load_prompt(cli: &Cli) -> Result<String, AppError> {
    if !cli.prompt.is_empty() {
        info!("Using prompt provided through CLI arguments");
        return Ok(cli.prompt.join(" ").trim().to_string());
    }

    if !std::io::stdin().is_terminal() {
        info!("Reading prompt from standard input");
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .await
            .map_err(AppError::Prompt)?;
        let prompt = buffer.trim();
        if !prompt.is_empty() {
            return Ok(prompt.to_string());
        }
    }

    Err(AppError::MissingPrompt)
}

/// Tracing is off in interactive mode, so server stderr goes straight to ours.
fn console_diagnostics(server: String) -> DiagnosticSink {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            eprintln!("[{server}] {line}");
        }
    });
    tx
}

fn print_banner<P: model::ModelProvider>(session: &ChatSession<P>) {
    let names = session.catalog().names();
    if names.is_empty() {
        println!("Connected. No tools available.");
    } else {
        println!("Connected. Tools: {}", names.join(", "));
    }
    println!("Type a message, /tools, /reset, or exit.");
}
