use super::error::RpcError;
use super::rpc::RpcClient;
use crate::domain::ToolCallResult;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Something that can execute a named tool. The conversation loop only
/// depends on this, so it can run against a stub.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolCallResult, RpcError>;
}

#[async_trait]
impl ToolInvoker for RpcClient {
    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolCallResult, RpcError> {
        RpcClient::call_tool(self, name, arguments).await
    }
}
