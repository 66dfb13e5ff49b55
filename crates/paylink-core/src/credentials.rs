//! Credential Model
//!
//! Dealer credentials for a payment gateway, and the two ways of obtaining
//! them: once from process configuration (single-session) or per call from
//! request headers (multi-tenant). The two paths share no fallback.

use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, Result};

/// Header aliases for the dealer code, in priority order
pub const DEALER_CODE_HEADERS: &[&str] = &["X-Dealer-Code", "Dealer-Code", "dealercode"];

/// Header aliases for the username, in priority order
pub const USERNAME_HEADERS: &[&str] = &["X-Username", "Username", "username"];

/// Header aliases for the password, in priority order
pub const PASSWORD_HEADERS: &[&str] = &["X-Password", "Password", "password"];

/// Header aliases for the customer type id, in priority order
pub const CUSTOMER_TYPE_ID_HEADERS: &[&str] =
    &["X-Customer-Type-ID", "Customer-Type-ID", "customertypeid"];

/// Where a credential set came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// Process configuration (CLI flags or environment)
    Environment,

    /// Metadata headers of a single inbound request
    RequestHeaders,
}

/// Dealer credentials for one gateway account.
///
/// Construction guarantees all four fields are non-empty. `Debug` never
/// prints the values.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    dealer_code: String,
    username: String,
    password: String,
    customer_type_id: String,
    source: CredentialSource,
}

impl Credentials {
    /// Build the single-session credential set from process configuration.
    ///
    /// Errors name the missing fields, never their values.
    pub fn from_config(
        dealer_code: &str,
        username: &str,
        password: &str,
        customer_type_id: &str,
    ) -> Result<Self> {
        Self::from_fields(
            [
                ("dealer_code", Some(dealer_code)),
                ("username", Some(username)),
                ("password", Some(password)),
                ("customer_type_id", Some(customer_type_id)),
            ],
            CredentialSource::Environment,
        )
    }

    /// Build a per-request credential set from header `(name, value)` pairs.
    ///
    /// Each field is looked up through its alias list; aliases are compared
    /// ASCII case-insensitively and the first alias present wins.
    pub fn from_headers<'a, I>(headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)> + Clone,
    {
        Self::from_fields(
            [
                ("dealer_code", header_lookup(headers.clone(), DEALER_CODE_HEADERS)),
                ("username", header_lookup(headers.clone(), USERNAME_HEADERS)),
                ("password", header_lookup(headers.clone(), PASSWORD_HEADERS)),
                ("customer_type_id", header_lookup(headers, CUSTOMER_TYPE_ID_HEADERS)),
            ],
            CredentialSource::RequestHeaders,
        )
    }

    fn from_fields(fields: [(&str, Option<&str>); 4], source: CredentialSource) -> Result<Self> {
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.is_none_or(|v| v.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(PaymentError::MissingCredentials(format!(
                "required credential fields are empty: {}",
                missing.join(", ")
            )));
        }

        // Stored verbatim: whitespace inside a secret is part of the secret
        let [dealer_code, username, password, customer_type_id] =
            fields.map(|(_, value)| value.unwrap_or_default().to_string());

        Ok(Self {
            dealer_code,
            username,
            password,
            customer_type_id,
            source,
        })
    }

    pub fn dealer_code(&self) -> &str {
        &self.dealer_code
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn customer_type_id(&self) -> &str {
        &self.customer_type_id
    }

    pub const fn source(&self) -> CredentialSource {
        self.source
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("dealer_code", &"<redacted>")
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .field("customer_type_id", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// First value found under any of `aliases`, tried in order
pub fn header_lookup<'a, I>(headers: I, aliases: &[&str]) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a str, &'a str)> + Clone,
{
    aliases.iter().find_map(|alias| {
        headers
            .clone()
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(alias))
            .map(|(_, value)| value)
    })
}
