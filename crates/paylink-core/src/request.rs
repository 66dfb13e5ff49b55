//! Payment Link Request
//!
//! Normalization and validation of raw `create_payment_link` arguments.
//! Only `amount` is required. Keys this module does not model are kept
//! verbatim in [`PaymentLinkRequest::extra`] for the provider to interpret.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PaymentError, Result};

/// Argument keys modelled as typed fields; everything else is pass-through
const TYPED_KEYS: &[&str] = &[
    "amount",
    "currency",
    "other_trx_code",
    "full_name",
    "email",
    "gsm_number",
    "installment_number",
];

/// Minor-unit precision of every supported currency
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;

/// Pass-through keys that must still look like an email when present
const EMAIL_KEYS: &[&str] = &["customer_email", "buyer_email"];

/// Pass-through keys that must still be digits-only when present
const GSM_KEYS: &[&str] = &["customer_gsm_number", "buyer_gsm_number"];

/// Supported settlement currencies
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Turkish lira, written `TL` by Turkish gateways
    #[default]
    Tl,
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tl => "TL",
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
        }
    }
}

impl FromStr for Currency {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TL" | "TRY" => Ok(Self::Tl),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            other => Err(PaymentError::Validation(format!(
                "unsupported currency '{other}' (expected one of TL, TRY, USD, EUR, GBP)"
            ))),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated request to create a payment link
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentLinkRequest {
    /// Strictly positive amount
    pub amount: Decimal,

    pub currency: Currency,

    /// Caller's own transaction code for reconciliation
    pub other_trx_code: Option<String>,

    pub full_name: Option<String>,

    pub email: Option<String>,

    pub gsm_number: Option<String>,

    pub installment_number: Option<u32>,

    /// Untyped pass-through arguments for provider-specific fields
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl PaymentLinkRequest {
    /// Request with only an amount; everything else defaulted
    pub fn new(amount: Decimal) -> Self {
        Self {
            amount,
            currency: Currency::default(),
            other_trx_code: None,
            full_name: None,
            email: None,
            gsm_number: None,
            installment_number: None,
            extra: Map::new(),
        }
    }

    /// String view of a pass-through argument; numbers and booleans are stringified
    pub fn extra_str(&self, key: &str) -> Option<String> {
        match self.extra.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(u8::from(*b).to_string()),
            _ => None,
        }
    }
}

/// Validate raw tool arguments into a [`PaymentLinkRequest`].
pub fn validate(arguments: &Map<String, Value>) -> Result<PaymentLinkRequest> {
    let amount = parse_amount(arguments.get("amount"))?;

    let currency = match optional_string(arguments, "currency")? {
        Some(code) => code.parse()?,
        None => Currency::default(),
    };

    let email = optional_string(arguments, "email")?;
    if let Some(ref email) = email {
        check_email("email", email)?;
    }

    let gsm_number = optional_string(arguments, "gsm_number")?;
    if let Some(ref gsm) = gsm_number {
        check_gsm("gsm_number", gsm)?;
    }

    let installment_number = parse_installments(arguments.get("installment_number"))?;

    let extra: Map<String, Value> = arguments
        .iter()
        .filter(|(key, _)| !TYPED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    for key in EMAIL_KEYS {
        if let Some(Value::String(value)) = extra.get(*key) {
            if !value.trim().is_empty() {
                check_email(key, value.trim())?;
            }
        }
    }
    for key in GSM_KEYS {
        if let Some(Value::String(value)) = extra.get(*key) {
            if !value.trim().is_empty() {
                check_gsm(key, value.trim())?;
            }
        }
    }

    Ok(PaymentLinkRequest {
        amount,
        currency,
        other_trx_code: optional_string(arguments, "other_trx_code")?,
        full_name: optional_string(arguments, "full_name")?,
        email,
        gsm_number,
        installment_number,
        extra,
    })
}

fn parse_amount(value: Option<&Value>) -> Result<Decimal> {
    let amount = match value {
        None | Some(Value::Null) => {
            return Err(PaymentError::Validation("amount is required".into()));
        }
        Some(Value::Number(n)) => parse_decimal(&n.to_string()),
        Some(Value::String(s)) => parse_decimal(s.trim()),
        Some(_) => None,
    }
    .ok_or_else(|| PaymentError::Validation("amount must be a number".into()))?;

    if amount <= Decimal::ZERO {
        return Err(PaymentError::Validation(
            "payment amount must be greater than 0".into(),
        ));
    }

    // Trailing zeros do not count: 10.50 and 10.500 are the same amount
    let amount = amount.normalize();
    if amount.scale() > AMOUNT_DECIMAL_PLACES {
        return Err(PaymentError::Validation(format!(
            "amount supports at most {AMOUNT_DECIMAL_PLACES} decimal places"
        )));
    }

    Ok(amount)
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn parse_installments(value: Option<&Value>) -> Result<Option<u32>> {
    let invalid = || {
        PaymentError::Validation("installment_number must be a non-negative integer".into())
    };

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(invalid),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse::<u32>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

/// Non-empty trimmed string argument. Empty strings count as absent.
fn optional_string(arguments: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match arguments.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_string()))
        }
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(PaymentError::Validation(format!("{key} must be a string"))),
    }
}

fn check_email(key: &str, value: &str) -> Result<()> {
    if value.contains('@') {
        Ok(())
    } else {
        Err(PaymentError::Validation(format!("{key} has an invalid email format")))
    }
}

fn check_gsm(key: &str, value: &str) -> Result<()> {
    if value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(PaymentError::Validation(format!("{key} must contain only digits")))
    }
}
