//! # paylink-core
//!
//! Provider-agnostic core of the payment-link tool server.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Dispatcher                           │
//! │  ┌─────────────┐  ┌───────────────┐  ┌────────────────────┐  │
//! │  │  Request    │  │  Credentials  │  │  PaymentProvider   │  │
//! │  │  Validator  │──│  (CallScope)  │──│  (Strategy)        │  │
//! │  └─────────────┘  └───────────────┘  └────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `PaymentProvider` trait enables swapping gateways without changing
//! validation, dispatch, or transport code. Transports bind credentials to a
//! [`CallScope`]; the [`Dispatcher`] does the rest.

pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod provider;
pub mod request;
pub mod tool;

pub use credentials::{CredentialSource, Credentials};
pub use dispatch::{CallScope, CallStage, Dispatcher};
pub use error::{ErrorDetail, ErrorKind, PaymentError, Result};
pub use provider::{PaymentLink, PaymentLinkResult, PaymentProvider, ProviderResolver};
pub use request::{Currency, PaymentLinkRequest};
pub use tool::{CREATE_PAYMENT_LINK, ToolResponse, ToolSchema};
