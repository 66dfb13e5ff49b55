//! # paylink-providers
//!
//! Payment gateway implementations for paylink-mcp.
//!
//! ## Providers
//!
//! - **Moka United** (`moka`): user-POS payment links
//!
//! ## Usage
//!
//! ```rust,ignore
//! use paylink_providers::{ProviderRegistry, ProvidersConfig};
//!
//! let registry = Arc::new(ProviderRegistry::new(ProvidersConfig::default())?);
//! let dispatcher = Dispatcher::new(registry);
//! ```

pub mod http;
pub mod moka;
pub mod registry;

pub use moka::{MokaConfig, MokaProvider};
pub use registry::{ProviderKind, ProviderRegistry, ProvidersConfig, RegistryError};

// Re-export core types for convenience
pub use paylink_core::{PaymentError, PaymentProvider, ProviderResolver, Result};
