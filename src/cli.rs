use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "ollama-mcp-client",
    version,
    about = "Chat with an Ollama model that can call tools from a stdio tool server"
)]
pub struct Cli {
    #[arg(long)]
    pub config: Option<String>,
    /// Overrides `[ollama] endpoint` from the config file
    #[arg(long)]
    pub ollama_url: Option<String>,
    /// Overrides `model` from the config file
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long, short, value_enum, default_value_t = RunMode::Stdio)]
    pub mode: RunMode,
    /// Prompt for `ask` mode; read from stdin when omitted
    #[arg()]
    pub prompt: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum RunMode {
    /// Interactive chat on stdin/stdout
    Stdio,
    /// Answer a single prompt and exit
    Ask,
}
