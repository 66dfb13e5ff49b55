//! Application State

use std::sync::Arc;

use paylink_providers::ProviderKind;

use crate::mcp::McpService;

/// Shared HTTP application state
#[derive(Clone)]
pub struct AppState {
    /// Request handling, including the dispatcher and provider registry
    pub service: Arc<McpService>,

    /// Provider used when a request does not name one
    pub default_provider: ProviderKind,
}
