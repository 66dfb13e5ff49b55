//! Shared HTTP client for gateway calls.
//!
//! One pooled client serves every provider. It holds no credentials; those
//! travel in each request body.

use std::time::Duration;

use reqwest::Client;

/// Connect timeout, independent of the total request bound
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Creates a configured HTTP client with connection pooling.
///
/// Configuration:
/// - Connection timeout: 10 seconds (or `timeout`, if shorter)
/// - Total timeout: `timeout`
/// - Connection pool: max 10 idle connections per host
///
/// # Errors
///
/// Returns error if client configuration fails.
pub fn create_http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .pool_max_idle_per_host(10)
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .user_agent(concat!("paylink-mcp/", env!("CARGO_PKG_VERSION")))
        .build()
}
