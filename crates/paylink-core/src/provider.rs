//! Payment Provider Strategy Pattern
//!
//! Defines a common interface for all payment gateways (Moka United, ...)
//! so dispatch and transports work with any backend without code changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use paylink_core::provider::PaymentProvider;
//!
//! let provider = MokaProvider::new(config)?;
//! let link = provider.create_payment_link(&credentials, &request).await?;
//! println!("{}", link.link_url);
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::error::{ErrorDetail, Result};
use crate::request::PaymentLinkRequest;

/// A link successfully created by a gateway
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentLink {
    /// URL the payer opens to complete the payment
    pub link_url: String,

    /// Gateway-side identifier for later reconciliation (opaque here)
    pub provider_reference: Option<String>,

    /// Full gateway response, untouched
    pub raw_provider_payload: Option<serde_json::Value>,
}

/// Outcome of one `create_payment_link` call.
///
/// Built only through [`PaymentLinkResult::succeeded`] or
/// [`PaymentLinkResult::failed`]: exactly one of `link_url` / `error` is set.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PaymentLinkResult {
    success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    link_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    provider_reference: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    raw_provider_payload: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorDetail>,
}

impl PaymentLinkResult {
    pub fn succeeded(link: PaymentLink) -> Self {
        Self {
            success: true,
            link_url: Some(link.link_url),
            provider_reference: link.provider_reference,
            raw_provider_payload: link.raw_provider_payload,
            error: None,
        }
    }

    pub fn failed(error: impl Into<ErrorDetail>) -> Self {
        Self {
            success: false,
            link_url: None,
            provider_reference: None,
            raw_provider_payload: None,
            error: Some(error.into()),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.success
    }

    pub fn link_url(&self) -> Option<&str> {
        self.link_url.as_deref()
    }

    pub fn provider_reference(&self) -> Option<&str> {
        self.provider_reference.as_deref()
    }

    pub const fn raw_provider_payload(&self) -> Option<&serde_json::Value> {
        self.raw_provider_payload.as_ref()
    }

    pub const fn error(&self) -> Option<&ErrorDetail> {
        self.error.as_ref()
    }
}

impl From<Result<PaymentLink>> for PaymentLinkResult {
    fn from(result: Result<PaymentLink>) -> Self {
        match result {
            Ok(link) => Self::succeeded(link),
            Err(err) => Self::failed(err),
        }
    }
}

/// Strategy trait for payment gateways
///
/// Implement this trait to add support for a new gateway. Implementations
/// must not keep credentials beyond the call and must bound every network
/// wait; faults are reported through [`crate::PaymentError`] variants, never
/// as free-form strings.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Registry name of this provider (lowercase)
    fn name(&self) -> &str;

    /// Ask the gateway for a payment link.
    ///
    /// `credentials` are complete and `request` is already validated.
    async fn create_payment_link(
        &self,
        credentials: &Credentials,
        request: &PaymentLinkRequest,
    ) -> Result<PaymentLink>;
}

/// Lookup from provider name to a ready provider instance
pub trait ProviderResolver: Send + Sync {
    /// Resolve a name (case-insensitive) or fail with `UnknownProvider`
    fn resolve(&self, name: &str) -> Result<Arc<dyn PaymentProvider>>;

    /// Whether `name` would resolve
    fn is_registered(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }
}
