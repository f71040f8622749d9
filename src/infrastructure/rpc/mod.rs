//! JSON-RPC 2.0 envelopes used on the tool server's stdio channel.

mod types;

pub use types::{JSONRPC_VERSION, RpcErrorObject, RpcRequest, RpcResponse};
