//! Transports
//!
//! - [`stdio`]: one client, credentials fixed at startup
//! - [`http`]: many clients, credentials per request via [`tenant`]

pub mod http;
pub mod stdio;
pub mod tenant;

pub use http::{router, serve_http};
pub use stdio::serve_stdio;
pub use tenant::TenantBinder;
