//! MCP Service
//!
//! Transport-independent request handling: one tool, `create_payment_link`,
//! plus the lifecycle methods a client needs to reach it.

use std::sync::Arc;

use paylink_core::{
    CREATE_PAYMENT_LINK, CallScope, Dispatcher, Result, ToolResponse, ToolSchema,
    tool::create_payment_link_schema,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use super::protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, Reply, SUPPORTED_PROTOCOL_VERSIONS,
};

/// Binds a provider and credentials to a tool call.
///
/// Only consulted for `tools/call`, so lifecycle methods work without
/// credentials.
pub trait ScopeBinder: Send + Sync {
    fn bind(&self) -> Result<CallScope>;
}

/// Binder for single-session transports: the same scope on every call
pub struct FixedScope(CallScope);

impl FixedScope {
    pub const fn new(scope: CallScope) -> Self {
        Self(scope)
    }
}

impl ScopeBinder for FixedScope {
    fn bind(&self) -> Result<CallScope> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// Handles decoded JSON-RPC traffic for both transports
pub struct McpService {
    dispatcher: Arc<Dispatcher>,
    tool: ToolSchema,
}

impl McpService {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            tool: create_payment_link_schema(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handle one line or body of raw JSON text
    pub async fn handle_text(&self, text: &str, binder: &dyn ScopeBinder) -> Option<Reply> {
        match serde_json::from_str::<Value>(text) {
            Ok(message) => self.handle_message(message, binder).await,
            Err(e) => Some(Reply::Single(JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::parse_error(e),
            ))),
        }
    }

    /// Handle a single message or a batch. `None` means nothing to send back.
    pub async fn handle_message(&self, message: Value, binder: &dyn ScopeBinder) -> Option<Reply> {
        match message {
            Value::Array(items) if items.is_empty() => Some(Reply::Single(JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::invalid_request("empty batch"),
            ))),
            Value::Array(items) => {
                let mut responses = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(response) = self.handle_one(item, binder).await {
                        responses.push(response);
                    }
                }
                (!responses.is_empty()).then_some(Reply::Batch(responses))
            }
            single => self.handle_one(single, binder).await.map(Reply::Single),
        }
    }

    async fn handle_one(
        &self,
        message: Value,
        binder: &dyn ScopeBinder,
    ) -> Option<JsonRpcResponse> {
        let request = match JsonRpcRequest::from_value(message) {
            Ok(request) => request,
            Err(response) => return Some(response),
        };

        if request.is_notification() {
            debug!(method = %request.method, "notification");
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        Some(match self.handle_request(request, binder).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    #[instrument(name = "mcp.request", skip_all, fields(method = %request.method))]
    async fn handle_request(
        &self,
        request: JsonRpcRequest,
        binder: &dyn ScopeBinder,
    ) -> std::result::Result<Value, JsonRpcError> {
        match request.method.as_str() {
            "initialize" => Ok(Self::initialize(request.params.as_ref())),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": [self.tool.to_definition()] })),
            "tools/call" => self.call_tool(request.params, binder).await,
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }

    fn initialize(params: Option<&Value>) -> Value {
        let requested = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str);
        let version = requested
            .and_then(|v| SUPPORTED_PROTOCOL_VERSIONS.iter().find(|s| **s == v))
            .or_else(|| SUPPORTED_PROTOCOL_VERSIONS.first())
            .copied()
            .unwrap_or_default();

        json!({
            "protocolVersion": version,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": {
                "name": "paylink-mcp",
                "version": env!("CARGO_PKG_VERSION"),
            },
            "instructions": "Use create_payment_link to create a hosted payment page link.",
        })
    }

    async fn call_tool(
        &self,
        params: Option<Value>,
        binder: &dyn ScopeBinder,
    ) -> std::result::Result<Value, JsonRpcError> {
        let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(JsonRpcError::invalid_params)?;

        if params.name != CREATE_PAYMENT_LINK {
            return Err(JsonRpcError::invalid_params(format!("unknown tool '{}'", params.name)));
        }

        let arguments = match params.arguments {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => return Err(JsonRpcError::invalid_params("arguments must be an object")),
        };

        let result = self.dispatcher.dispatch(binder.bind(), &arguments).await;
        serde_json::to_value(ToolResponse::from(&result)).map_err(JsonRpcError::internal_error)
    }
}
