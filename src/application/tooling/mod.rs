//! Tool server plumbing: the stdio channel, JSON-RPC on top of it and the
//! catalog of advertised tools.

mod catalog;
mod error;
mod interface;
mod rpc;
mod transport;

pub use catalog::{DescriptionHints, ToolCatalog};
pub use error::{RpcError, TransportError};
pub use interface::ToolInvoker;
pub use rpc::RpcClient;
pub use transport::{ChannelGuard, DiagnosticSink, Transport};
