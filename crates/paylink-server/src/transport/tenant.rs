//! Per-request binding for the multi-tenant transport.
//!
//! Every request names its own provider (or inherits the process default)
//! and carries its own credentials. Nothing falls back to process
//! configuration.

use axum::http::HeaderMap;
use paylink_core::{CallScope, Credentials, ProviderResolver, Result, credentials::header_lookup};

use crate::mcp::ScopeBinder;

/// Header aliases selecting a provider, in priority order
pub const PROVIDER_HEADERS: &[&str] =
    &["X-Payment-Provider", "Payment-Provider", "paymentprovider"];

/// Binds a call from the headers of the request that carried it
pub struct TenantBinder<'a> {
    headers: &'a HeaderMap,
    default_provider: &'a str,
    resolver: &'a dyn ProviderResolver,
}

impl<'a> TenantBinder<'a> {
    pub const fn new(
        headers: &'a HeaderMap,
        default_provider: &'a str,
        resolver: &'a dyn ProviderResolver,
    ) -> Self {
        Self {
            headers,
            default_provider,
            resolver,
        }
    }
}

impl ScopeBinder for TenantBinder<'_> {
    /// The provider is checked before credentials are read, so an unknown
    /// provider is reported even when credentials are also missing.
    fn bind(&self) -> Result<CallScope> {
        // Non-UTF-8 header values are treated as absent
        let pairs: Vec<(&str, &str)> = self
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
            .collect();

        let provider = header_lookup(pairs.iter().copied(), PROVIDER_HEADERS)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(self.default_provider);
        self.resolver.resolve(provider)?;

        let credentials = Credentials::from_headers(pairs.iter().copied())?;
        Ok(CallScope::new(provider, credentials))
    }
}
