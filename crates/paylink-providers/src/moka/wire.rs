//! Moka United wire format.
//!
//! Maps a [`PaymentLinkRequest`] onto the `CreateUserPosPayment` body and
//! classifies the gateway's answer.

use paylink_core::{
    Credentials, PaymentError, PaymentLink, PaymentLinkRequest, Result,
    request::AMOUNT_DECIMAL_PLACES,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

const SUCCESS_CODE: &str = "Success";

/// `hex(sha256("{dealer_code}MK{username}PD{password}"))`
pub fn check_key(credentials: &Credentials) -> String {
    let mut hasher = Sha256::new();
    hasher.update(credentials.dealer_code().as_bytes());
    hasher.update(b"MK");
    hasher.update(credentials.username().as_bytes());
    hasher.update(b"PD");
    hasher.update(credentials.password().as_bytes());
    hex::encode(hasher.finalize())
}

/// Amount as Moka expects it: at least two decimals, never rounded.
///
/// `10.5` becomes `"10.50"`; a value with more precision keeps all of it.
pub fn format_amount(amount: Decimal) -> String {
    let mut amount = amount.normalize();
    if amount.scale() < AMOUNT_DECIMAL_PLACES {
        amount.rescale(AMOUNT_DECIMAL_PLACES);
    }
    amount.to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreatePaymentBody<'a> {
    pub dealer_authentication: DealerAuthentication<'a>,
    pub payment_user_pos_request: PaymentUserPosRequest,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DealerAuthentication<'a> {
    pub dealer_code: &'a str,
    pub username: &'a str,
    pub password: &'a str,
    pub check_key: String,
}

impl std::fmt::Debug for DealerAuthentication<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DealerAuthentication { <redacted> }")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentUserPosRequest {
    pub other_trx_code: String,
    pub dealer_customer_type_id: String,
    pub full_name: String,
    pub gsm_number: String,
    pub email: String,
    pub is_pre_auth: String,
    pub is_pool_payment: String,
    pub is_tokenized: String,
    pub dealer_customer_id: String,
    pub customer_code: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub birth_date: String,
    pub customer_gsm_number: String,
    pub customer_email: String,
    pub address: String,
    pub amount: String,
    pub currency: String,
    pub installment_number: String,
    pub set_installment_by: String,
    pub is_three_d: String,
    pub description: String,
    pub redirect_url: String,
    pub commission_by_dealer: String,
    pub is_commission_diff_by_dealer: String,
    pub return_hash: u8,
    pub buyer_information: BuyerInformation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuyerInformation {
    pub buyer_full_name: String,
    pub buyer_gsm_number: String,
    pub buyer_email: String,
    pub buyer_address: String,
}

/// Transaction code sent when the caller gives none
pub const DEFAULT_OTHER_TRX_CODE: &str = "1";

impl<'a> CreatePaymentBody<'a> {
    pub fn build(credentials: &'a Credentials, request: &PaymentLinkRequest) -> Self {
        let extra = |key: &str| request.extra_str(key).unwrap_or_default();
        let flag = |key: &str, default: &str| {
            request
                .extra_str(key)
                .unwrap_or_else(|| default.to_string())
        };

        let full_name = request.full_name.clone().unwrap_or_default();
        let gsm_number = request.gsm_number.clone().unwrap_or_default();
        let email = request.email.clone().unwrap_or_default();

        // full_name fills whichever of first/last name the caller left empty
        let mut first_name = extra("first_name");
        let mut last_name = extra("last_name");
        if !full_name.is_empty() && (first_name.is_empty() || last_name.is_empty()) {
            let (first, rest) = full_name
                .split_once(' ')
                .map_or((full_name.as_str(), ""), |(first, rest)| (first, rest.trim()));
            if first_name.is_empty() {
                first_name = first.to_string();
            }
            if last_name.is_empty() {
                last_name = rest.to_string();
            }
        }

        let or_fallback = |value: String, fallback: &str| {
            if value.is_empty() {
                fallback.to_string()
            } else {
                value
            }
        };

        Self {
            dealer_authentication: DealerAuthentication {
                dealer_code: credentials.dealer_code(),
                username: credentials.username(),
                password: credentials.password(),
                check_key: check_key(credentials),
            },
            payment_user_pos_request: PaymentUserPosRequest {
                other_trx_code: request
                    .other_trx_code
                    .clone()
                    .unwrap_or_else(|| DEFAULT_OTHER_TRX_CODE.to_string()),
                dealer_customer_type_id: credentials.customer_type_id().to_string(),
                is_pre_auth: flag("is_pre_auth", "0"),
                is_pool_payment: flag("is_pool_payment", "0"),
                is_tokenized: flag("is_tokenized", "0"),
                dealer_customer_id: String::new(),
                customer_code: extra("customer_code"),
                first_name,
                last_name,
                gender: "0".into(),
                birth_date: extra("birth_date"),
                customer_gsm_number: or_fallback(extra("customer_gsm_number"), &gsm_number),
                customer_email: or_fallback(extra("customer_email"), &email),
                address: extra("address"),
                amount: format_amount(request.amount),
                currency: request.currency.as_str().to_string(),
                installment_number: request.installment_number.unwrap_or(0).to_string(),
                set_installment_by: flag("set_installment_by", "1"),
                is_three_d: flag("is_three_d", "1"),
                description: extra("description"),
                redirect_url: extra("redirect_url"),
                commission_by_dealer: flag("commission_by_dealer", "0"),
                is_commission_diff_by_dealer: flag("is_commission_diff_by_dealer", "0"),
                return_hash: 1,
                buyer_information: BuyerInformation {
                    buyer_full_name: or_fallback(extra("buyer_full_name"), &full_name),
                    buyer_gsm_number: or_fallback(extra("buyer_gsm_number"), &gsm_number),
                    buyer_email: or_fallback(extra("buyer_email"), &email),
                    buyer_address: extra("buyer_address"),
                },
                full_name,
                gsm_number,
                email,
            },
        }
    }

    pub fn other_trx_code(&self) -> &str {
        &self.payment_user_pos_request.other_trx_code
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MokaResponse {
    #[serde(default)]
    data: Option<MokaData>,
    #[serde(default)]
    result_code: Option<String>,
    #[serde(default)]
    result_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MokaData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    code_for_hash: Option<String>,
}

/// Authentication failures all live under the dealer-authentication check
fn is_auth_failure(code: &str) -> bool {
    code.contains("Authentication") || code.contains("InvalidAccount")
}

/// Classify a decoded 2xx response body
pub fn interpret_response(raw: Value, other_trx_code: &str) -> Result<PaymentLink> {
    let response: MokaResponse = serde_json::from_value(raw.clone()).map_err(|e| {
        PaymentError::UpstreamProtocol(format!("unexpected Moka response shape: {e}"))
    })?;

    let code = response.result_code.unwrap_or_default();
    let message = response.result_message.unwrap_or_default();
    let describe = || {
        if message.is_empty() {
            code.clone()
        } else {
            format!("{code}: {message}")
        }
    };

    if code.is_empty() {
        return Err(PaymentError::UpstreamProtocol(
            "Moka response carried no ResultCode".into(),
        ));
    }

    if code != SUCCESS_CODE {
        return Err(if is_auth_failure(&code) {
            PaymentError::AuthenticationFailed(describe())
        } else {
            PaymentError::RequestRejected(describe())
        });
    }

    let data = response.data.ok_or_else(|| {
        PaymentError::UpstreamProtocol("Moka reported success without Data".into())
    })?;
    let link_url = data
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| {
            PaymentError::UpstreamProtocol("Moka reported success without a Url".into())
        })?;

    Ok(PaymentLink {
        link_url,
        provider_reference: Some(
            data.code_for_hash
                .filter(|code| !code.is_empty())
                .unwrap_or_else(|| other_trx_code.to_string()),
        ),
        raw_provider_payload: Some(raw),
    })
}
