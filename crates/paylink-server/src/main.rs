//! paylink-server binary
//!
//! Loads `.env`, parses configuration, and serves the chosen transport.
//! Invalid configuration exits non-zero before any client is served.

use clap::Parser;

use paylink_server::config::ServerConfig;
use paylink_server::observability::init_observability;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let config = ServerConfig::parse();
    init_observability(config.log_format);

    let startup = config.into_startup().inspect_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
    })?;

    tracing::info!(
        provider = %startup.provider,
        transport = startup.mode.name(),
        "Starting paylink-server v{}",
        env!("CARGO_PKG_VERSION")
    );

    paylink_server::run(startup).await
}
