//! Server Configuration
//!
//! CLI flags with environment fallbacks. `main` loads `.env` before parsing,
//! so a dotenv file behaves like the real environment.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use paylink_core::{Credentials, PaymentError};
use paylink_providers::{MokaConfig, ProviderKind, ProvidersConfig, moka::PRODUCTION_URL};
use thiserror::Error;

use crate::observability::LogFormat;

/// Startup failures. Each one ends the process with a non-zero status.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("provider configuration: {0}")]
    Provider(#[source] PaymentError),

    #[error("credential configuration: {0}")]
    Credentials(#[source] PaymentError),

    #[error("upstream timeout must be at least one second")]
    ZeroTimeout,
}

/// How agent clients reach the server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// One client over stdin/stdout, credentials from configuration
    #[default]
    Stdio,
    /// Many clients over HTTP, credentials from request headers
    Http,
}

/// Payment-link MCP server
#[derive(Parser, Clone)]
#[command(name = "paylink-server", version)]
#[command(about = "MCP server exposing a create_payment_link tool")]
pub struct ServerConfig {
    /// Payment provider used when a request does not pick one
    #[arg(long, env = "PROVIDER", default_value = "moka")]
    pub provider: String,

    /// Transport to serve
    #[arg(long, env = "TRANSPORT", value_enum, default_value_t = Transport::Stdio)]
    pub transport: Transport,

    /// HTTP bind host
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// HTTP bind port
    #[arg(long, env = "PORT", default_value_t = 8050)]
    pub port: u16,

    /// Dealer code (stdio only)
    #[arg(long, env = "DEALER_CODE", default_value = "", hide_env_values = true)]
    pub dealer_code: String,

    /// API username (stdio only)
    #[arg(long, env = "USERNAME", default_value = "", hide_env_values = true)]
    pub username: String,

    /// API password (stdio only)
    #[arg(long, env = "PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    /// Dealer customer type id (stdio only)
    #[arg(long, env = "CUSTOMER_TYPE_ID", default_value = "2")]
    pub customer_type_id: String,

    /// Moka API base URL
    #[arg(long, env = "MOKA_BASE_URL", default_value = PRODUCTION_URL)]
    pub moka_base_url: String,

    /// Bound on one gateway call, in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 30)]
    pub upstream_timeout_secs: u64,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Transport-specific part of a validated configuration
#[derive(Debug)]
pub enum StartupMode {
    Stdio {
        credentials: Credentials,
    },
    Http {
        host: String,
        port: u16,
    },
}

impl StartupMode {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Stdio { .. } => "stdio",
            Self::Http { .. } => "http",
        }
    }
}

/// Everything `run` needs, already validated
#[derive(Debug)]
pub struct Startup {
    pub provider: ProviderKind,
    pub mode: StartupMode,
    pub providers: ProvidersConfig,
    pub upstream_timeout: Duration,
}

impl ServerConfig {
    /// Validate and pick a startup path.
    ///
    /// The provider name is checked first on both paths. Only stdio then
    /// requires process credentials; HTTP ignores them.
    pub fn into_startup(self) -> Result<Startup, ConfigError> {
        if self.upstream_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        let upstream_timeout = Duration::from_secs(self.upstream_timeout_secs);

        let provider = ProviderKind::from_name(&self.provider).map_err(ConfigError::Provider)?;

        let mode = match self.transport {
            Transport::Stdio => StartupMode::Stdio {
                credentials: Credentials::from_config(
                    &self.dealer_code,
                    &self.username,
                    &self.password,
                    &self.customer_type_id,
                )
                .map_err(ConfigError::Credentials)?,
            },
            Transport::Http => StartupMode::Http {
                host: self.host,
                port: self.port,
            },
        };

        Ok(Startup {
            provider,
            mode,
            providers: ProvidersConfig {
                http_timeout: upstream_timeout,
                moka: MokaConfig {
                    base_url: self.moka_base_url,
                    timeout: upstream_timeout,
                },
            },
            upstream_timeout,
        })
    }
}
