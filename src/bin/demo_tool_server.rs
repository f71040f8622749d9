//! Minimal tool server speaking line-delimited JSON-RPC on stdin/stdout.
//!
//! Offers `gettime` (left undocumented on purpose so clients fill in the
//! description) and `echo`. Diagnostics go to stderr.

use chrono::Local;
use clap::Parser;
use ollama_mcp_client::rpc::{RpcRequest, RpcResponse};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "demo-tool-server", about = "Demo stdio tool server")]
struct Args {
    /// Wait this long before serving requests
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();

    if args.delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(args.delay_ms)).await;
    }
    info!("demo-tool-server ready");

    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(response) = handle_line(&line) else {
            continue;
        };
        let mut payload = serde_json::to_vec(&response)?;
        payload.push(b'\n');
        stdout.write_all(&payload).await?;
        stdout.flush().await?;
    }

    info!("stdin closed, exiting");
    Ok(())
}

fn handle_line(line: &str) -> Option<RpcResponse> {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(err) => {
            warn!(%err, "discarding unparsable request");
            return Some(RpcResponse::error(None, -32700, "Parse error"));
        }
    };
    // Notifications carry no id and get no reply.
    value.get("id")?;

    let request: RpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(err) => {
            warn!(%err, "malformed request");
            return Some(RpcResponse::error(None, -32600, "Invalid Request"));
        }
    };
    debug!(id = request.id, method = request.method.as_str(), "request");

    let response = match request.method.as_str() {
        "tools/list" => RpcResponse::success(request.id, list_tools()),
        "tools/call" => {
            let name = request
                .params
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let arguments = request
                .params
                .get("arguments")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            RpcResponse::success(request.id, call_tool(name, &arguments))
        }
        other => RpcResponse::method_not_found(request.id, other),
    };
    Some(response)
}

fn list_tools() -> Value {
    json!({
        "tools": [
            {
                "name": "gettime",
                "description": "",
                "inputSchema": {"type": "object", "properties": {}}
            },
            {
                "name": "echo",
                "description": "Repeats the given message back.",
                "inputSchema": {
                    "type": "object",
                    "properties": {"message": {"type": "string"}},
                    "required": ["message"]
                }
            }
        ]
    })
}

fn call_tool(name: &str, arguments: &Map<String, Value>) -> Value {
    let text = match name {
        "gettime" => Local::now().format("%Y-%m-%d %H:%M:%S %:z").to_string(),
        "echo" => match arguments.get("message") {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => Value::Object(arguments.clone()).to_string(),
        },
        other => format!("Tool '{other}' not found."),
    };
    json!({ "content": [{ "type": "text", "text": text }] })
}
