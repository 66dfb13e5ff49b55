//! Provider Registry
//!
//! The closed set of gateways this build knows about. Adding a gateway means
//! adding a [`ProviderKind`] variant; the exhaustive match in
//! [`ProviderRegistry::new`] then refuses to compile until it is wired up.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use paylink_core::{PaymentError, PaymentProvider, ProviderResolver, Result};
use thiserror::Error;
use tracing::info;

use crate::http::create_http_client;
use crate::moka::{MokaConfig, MokaProvider};

/// Registry construction errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Every supported gateway
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Moka,
}

impl ProviderKind {
    pub const fn all() -> &'static [Self] {
        &[Self::Moka]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Moka => "moka",
        }
    }

    /// Case-insensitive lookup; surrounding whitespace is ignored
    pub fn from_name(name: &str) -> Result<Self> {
        let wanted = name.trim();
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::all().iter().map(|k| k.as_str()).collect();
                PaymentError::UnknownProvider(format!(
                    "'{wanted}' is not supported (available: {})",
                    known.join(", ")
                ))
            })
    }
}

impl FromStr for ProviderKind {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-provider settings
#[derive(Clone, Debug)]
pub struct ProvidersConfig {
    /// Total bound on one gateway HTTP call
    pub http_timeout: Duration,

    pub moka: MokaConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(30),
            moka: MokaConfig::default(),
        }
    }
}

/// Name → provider map, built once at startup and shared read-only
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn PaymentProvider>>,
}

impl ProviderRegistry {
    /// Build every known provider around one pooled HTTP client
    pub fn new(config: ProvidersConfig) -> std::result::Result<Self, RegistryError> {
        let client = create_http_client(config.http_timeout)?;

        let mut providers: HashMap<ProviderKind, Arc<dyn PaymentProvider>> = HashMap::new();
        for &kind in ProviderKind::all() {
            let provider: Arc<dyn PaymentProvider> = match kind {
                ProviderKind::Moka => Arc::new(MokaProvider::new(
                    client.clone(),
                    MokaConfig {
                        timeout: config.http_timeout,
                        ..config.moka.clone()
                    },
                )),
            };
            providers.insert(kind, provider);
        }

        info!(providers = ?ProviderKind::all(), "Provider registry ready");
        Ok(Self { providers })
    }

    /// Registered names, in declaration order
    pub fn names(&self) -> Vec<&'static str> {
        ProviderKind::all()
            .iter()
            .filter(|kind| self.providers.contains_key(kind))
            .map(|kind| kind.as_str())
            .collect()
    }
}

impl ProviderResolver for ProviderRegistry {
    fn resolve(&self, name: &str) -> Result<Arc<dyn PaymentProvider>> {
        let kind = ProviderKind::from_name(name)?;
        self.providers
            .get(&kind)
            .cloned()
            .ok_or_else(|| PaymentError::UnknownProvider(format!("'{kind}' is not registered")))
    }
}
