use super::catalog::ToolCatalog;
use super::error::{RpcError, TransportError};
use super::transport::{DiagnosticSink, Transport};
use crate::config::ServerConfig;
use crate::domain::{ToolCallResult, ToolDescriptor};
use crate::infrastructure::rpc::{RpcRequest, RpcResponse};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// JSON-RPC 2.0 client for a tool server. One request is in flight at a time;
/// each call writes a single line and reads the next line as its reply.
pub struct RpcClient {
    transport: Transport,
    id_counter: AtomicU64,
}

impl RpcClient {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            id_counter: AtomicU64::new(1),
        }
    }

    /// Spawns the server and waits until it answers `tools/list`, bounded by
    /// the configured startup timeout. The transport is stopped on failure.
    pub async fn connect(
        server: ServerConfig,
        diagnostics: Option<DiagnosticSink>,
    ) -> Result<(Self, ToolCatalog), RpcError> {
        let startup_timeout = server.startup_timeout;
        let transport = Transport::new(server).with_diagnostics(diagnostics);
        transport.start().await?;

        let client = Self::new(transport);
        match client.await_ready(startup_timeout).await {
            Ok(catalog) => Ok((client, catalog)),
            Err(err) => {
                client.shutdown().await;
                Err(err)
            }
        }
    }

    /// First `tools/list` doubles as the readiness probe.
    pub async fn await_ready(&self, timeout: Duration) -> Result<ToolCatalog, RpcError> {
        let started = Instant::now();
        let catalog = tokio::time::timeout(timeout, self.list_tools())
            .await
            .map_err(|_| RpcError::StartupTimeout {
                server: self.server_name().to_string(),
                timeout,
            })??;

        info!(
            server = self.server_name(),
            tools = catalog.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tool server ready"
        );
        Ok(catalog)
    }

    pub fn server_name(&self) -> &str {
        self.transport.server_name()
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Lists the server's tools. Missing fields get defaults and a reply
    /// without `result.tools` is an empty catalog.
    pub async fn list_tools(&self) -> Result<ToolCatalog, RpcError> {
        let response = self
            .exchange("tools/list", RpcRequest::list_tools)
            .await?;

        let tools = response
            .result
            .as_ref()
            .and_then(|result| result.get("tools"))
            .and_then(Value::as_array)
            .map(|entries| entries.iter().map(descriptor_from_entry).collect())
            .unwrap_or_default();

        Ok(ToolCatalog::new(tools))
    }

    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolCallResult, RpcError> {
        debug!(server = self.server_name(), tool = name, "Calling tool");
        let response = self
            .exchange("tools/call", |id| {
                RpcRequest::call_tool(id, name, Value::Object(arguments))
            })
            .await?;

        match response.result {
            Some(Value::Null) | None => Err(RpcError::MissingResult {
                server: self.server_name().to_string(),
                method: "tools/call".to_string(),
            }),
            Some(result) => Ok(ToolCallResult::new(result)),
        }
    }

    pub async fn shutdown(&self) {
        self.transport.stop().await;
    }

    async fn exchange<F>(&self, method: &str, build: F) -> Result<RpcResponse, RpcError>
    where
        F: FnOnce(u64) -> RpcRequest,
    {
        let mut channel = self.transport.channel().await?;

        // Allocated under the channel lock so ids go out in order.
        let id = self.id_counter.fetch_add(1, Ordering::Relaxed);
        let request = build(id);
        let line = serde_json::to_string(&request).map_err(|source| RpcError::Encode {
            method: method.to_string(),
            source,
        })?;
        channel.send_line(&line).await?;

        let reply = match channel.receive_line().await {
            Ok(reply) => reply,
            Err(TransportError::Closed { .. }) => return Err(self.empty_response(method)),
            Err(err) => return Err(err.into()),
        };
        drop(channel);

        if reply.trim().is_empty() {
            return Err(self.empty_response(method));
        }

        let response: RpcResponse =
            serde_json::from_str(&reply).map_err(|source| RpcError::InvalidJson {
                server: self.server_name().to_string(),
                source,
            })?;

        if !response.answers(id) {
            debug!(
                server = self.server_name(),
                expected = id,
                received = ?response.id,
                "reply id does not match request"
            );
        }

        if let Some(error) = response.error {
            warn!(
                server = self.server_name(),
                method,
                code = error.code,
                message = error.message.as_str(),
                "tool server returned an error"
            );
            return Err(RpcError::Server {
                server: self.server_name().to_string(),
                code: error.code,
                message: error.message,
            });
        }

        Ok(response)
    }

    fn empty_response(&self, method: &str) -> RpcError {
        RpcError::EmptyResponse {
            server: self.server_name().to_string(),
            method: method.to_string(),
        }
    }
}

fn descriptor_from_entry(entry: &Value) -> ToolDescriptor {
    let text = |key: &str| {
        entry
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let schema = entry
        .get("inputSchema")
        .filter(|schema| !schema.is_null())
        .cloned()
        .unwrap_or_else(ToolDescriptor::empty_schema);

    ToolDescriptor::new(text("name"), text("description"), schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, duplex};
    use tokio::task::JoinHandle;

    /// Fake server answering each request line with the next scripted reply.
    /// `None` closes the stream instead of replying.
    fn scripted_server(
        stream: DuplexStream,
        replies: Vec<Option<String>>,
    ) -> JoinHandle<Vec<Value>> {
        tokio::spawn(async move {
            let (read, mut write) = tokio::io::split(stream);
            let mut lines = BufReader::new(read).lines();
            let mut seen = Vec::new();
            for reply in replies {
                let Ok(Some(line)) = lines.next_line().await else {
                    break;
                };
                seen.push(serde_json::from_str(&line).expect("request json"));
                match reply {
                    Some(text) => {
                        write.write_all(text.as_bytes()).await.expect("write");
                        write.write_all(b"\n").await.expect("write");
                    }
                    None => break,
                }
            }
            seen
        })
    }

    fn client_with(replies: Vec<Option<String>>) -> (RpcClient, JoinHandle<Vec<Value>>) {
        let (client_side, server_side) = duplex(8192);
        let (read, write) = tokio::io::split(client_side);
        let client = RpcClient::new(Transport::attach("fake", read, write));
        (client, scripted_server(server_side, replies))
    }

    #[tokio::test]
    async fn list_tools_fills_defaults() {
        let (client, server) = client_with(vec![Some(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {"tools": [
                    {"name": "gettime"},
                    {"name": "echo", "description": "Echo text", "inputSchema": {"type": "object"}}
                ]}
            })
            .to_string(),
        )]);

        let catalog = client.list_tools().await.expect("list");
        assert_eq!(catalog.names(), vec!["gettime", "echo"]);

        let gettime = catalog.get("gettime").expect("gettime");
        assert_eq!(gettime.description, "");
        assert_eq!(gettime.input_schema, ToolDescriptor::empty_schema());

        let seen = server.await.expect("server");
        assert_eq!(seen[0]["method"], "tools/list");
        assert_eq!(seen[0]["id"], 1);
        assert_eq!(seen[0]["jsonrpc"], "2.0");
    }

    #[tokio::test]
    async fn missing_tools_member_is_an_empty_catalog() {
        let (client, _server) = client_with(vec![Some(r#"{"jsonrpc":"2.0","id":1}"#.into())]);
        assert!(client.list_tools().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn call_tool_sends_params_and_flattens_text() {
        let (client, server) = client_with(vec![Some(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {"content": [
                    {"type": "text", "text": "a"},
                    {"type": "image", "data": "..."},
                    {"type": "text", "text": "b"}
                ]}
            })
            .to_string(),
        )]);

        let mut args = Map::new();
        args.insert("message".into(), json!("hi"));
        let result = client.call_tool("echo", args).await.expect("call");
        assert_eq!(result.text(), "a b");

        let seen = server.await.expect("server");
        assert_eq!(seen[0]["method"], "tools/call");
        assert_eq!(seen[0]["params"], json!({"name": "echo", "arguments": {"message": "hi"}}));
    }

    #[tokio::test]
    async fn ids_increase_per_request() {
        let reply = |id: u64| Some(json!({"jsonrpc": "2.0", "id": id, "result": {}}).to_string());
        let (client, server) = client_with(vec![reply(1), reply(2)]);

        client.list_tools().await.expect("first");
        client.call_tool("gettime", Map::new()).await.expect("second");

        let ids: Vec<_> = server
            .await
            .expect("server")
            .iter()
            .map(|request| request["id"].as_u64().unwrap_or_default())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn error_member_becomes_server_error() {
        let (client, _server) = client_with(vec![Some(
            json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32601, "message": "no such method"}})
                .to_string(),
        )]);

        match client.call_tool("gettime", Map::new()).await.unwrap_err() {
            RpcError::Server { code, message, .. } => {
                assert_eq!(code, -32601);
                assert_eq!(message, "no such method");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn null_result_is_missing_result() {
        let (client, _server) =
            client_with(vec![Some(r#"{"jsonrpc":"2.0","id":1,"result":null}"#.into())]);
        let err = client.call_tool("gettime", Map::new()).await.unwrap_err();
        assert!(matches!(err, RpcError::MissingResult { .. }));
    }

    #[tokio::test]
    async fn blank_and_closed_replies_are_empty_responses() {
        let (client, _server) = client_with(vec![Some("   ".into())]);
        let err = client.list_tools().await.unwrap_err();
        assert!(matches!(err, RpcError::EmptyResponse { .. }));

        let (client, _server) = client_with(vec![None]);
        let err = client.list_tools().await.unwrap_err();
        assert!(matches!(err, RpcError::EmptyResponse { .. }));
    }

    #[tokio::test]
    async fn garbage_reply_is_invalid_json() {
        let (client, _server) = client_with(vec![Some("not json".into())]);
        let err = client.list_tools().await.unwrap_err();
        assert!(matches!(err, RpcError::InvalidJson { .. }));
    }

    #[tokio::test]
    async fn mismatched_reply_id_is_tolerated() {
        let (client, _server) = client_with(vec![Some(
            json!({"jsonrpc": "2.0", "id": 99, "result": {"tools": []}}).to_string(),
        )]);
        assert!(client.list_tools().await.expect("list").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn silent_server_times_out_during_startup() {
        let (client_side, _server_side) = duplex(1024);
        let (read, write) = tokio::io::split(client_side);
        let client = RpcClient::new(Transport::attach("fake", read, write));

        let err = client
            .await_ready(Duration::from_millis(250))
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::StartupTimeout { .. }));
    }

    #[tokio::test]
    async fn calls_after_shutdown_are_not_started() {
        let (client, _server) = client_with(vec![]);
        client.shutdown().await;
        let err = client.list_tools().await.unwrap_err();
        assert!(matches!(
            err,
            RpcError::Transport(TransportError::NotStarted { .. })
        ));
    }
}
