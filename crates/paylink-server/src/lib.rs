//! # paylink-server
//!
//! MCP server exposing `create_payment_link` to agent clients.
//!
//! ## Transports
//!
//! - **stdio**: one client per process; credentials come from CLI flags or
//!   the environment and are checked before the first message is read.
//! - **http**: `POST /mcp` for any number of tenants; each request carries
//!   its own credentials in headers. `GET /health` reports liveness.

pub mod config;
pub mod mcp;
pub mod observability;
pub mod state;
pub mod transport;

use std::sync::Arc;

use paylink_core::{CallScope, Dispatcher};
use paylink_providers::ProviderRegistry;
use tracing::info;

use crate::config::{Startup, StartupMode};
use crate::mcp::{FixedScope, McpService};
use crate::state::AppState;

/// Build the shared service stack for a validated configuration
pub fn build_service(startup: &Startup) -> anyhow::Result<Arc<McpService>> {
    let registry = Arc::new(ProviderRegistry::new(startup.providers.clone())?);
    info!(providers = ?registry.names(), default = %startup.provider, "Providers registered");

    let dispatcher = Dispatcher::new(registry).with_upstream_timeout(startup.upstream_timeout);
    Ok(Arc::new(McpService::new(Arc::new(dispatcher))))
}

/// Serve the configured transport until it ends
pub async fn run(startup: Startup) -> anyhow::Result<()> {
    let service = build_service(&startup)?;

    match startup.mode {
        StartupMode::Stdio { credentials } => {
            let binder = FixedScope::new(CallScope::new(startup.provider.as_str(), credentials));
            transport::serve_stdio(&service, &binder).await?;
        }
        StartupMode::Http { host, port } => {
            let state = AppState {
                service,
                default_provider: startup.provider,
            };
            transport::serve_http(state, &host, port).await?;
        }
    }

    Ok(())
}
