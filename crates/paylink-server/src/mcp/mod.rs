//! Model Context Protocol surface.
//!
//! JSON-RPC framing lives in [`protocol`]; method handling in [`service`].
//! Transports feed decoded messages to [`McpService`] together with a
//! [`ScopeBinder`] that says where credentials come from.

pub mod protocol;
pub mod service;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, Reply};
pub use service::{FixedScope, McpService, ScopeBinder};
