//! Moka United Provider
//!
//! Implementation of `PaymentProvider` for the Moka United user-POS payment
//! link API.

mod wire;

use std::time::Duration;

use async_trait::async_trait;
use paylink_core::{
    Credentials, PaymentError, PaymentLink, PaymentLinkRequest, PaymentProvider, Result,
};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};

pub use wire::check_key;
use wire::{CreatePaymentBody, interpret_response};

/// Production API base
pub const PRODUCTION_URL: &str = "https://service.mokaunited.com";

/// Sandbox API base
pub const TEST_URL: &str = "https://service.refmokaunited.com";

const CREATE_PAYMENT_PATH: &str = "/PaymentUserPos/CreateUserPosPayment";

/// Moka provider configuration
#[derive(Clone, Debug)]
pub struct MokaConfig {
    /// API base URL, without trailing slash
    pub base_url: String,

    /// Total request timeout
    pub timeout: Duration,
}

impl Default for MokaConfig {
    fn default() -> Self {
        Self {
            base_url: PRODUCTION_URL.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl MokaConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Sandbox configuration
    pub fn sandbox() -> Self {
        Self::new(TEST_URL)
    }

    fn endpoint(&self) -> String {
        format!("{}{CREATE_PAYMENT_PATH}", self.base_url.trim_end_matches('/'))
    }
}

/// Moka United payment-link provider.
///
/// Stateless apart from the pooled HTTP client: credentials arrive with every
/// call and are never stored.
pub struct MokaProvider {
    client: Client,
    config: MokaConfig,
}

impl MokaProvider {
    /// Create from configuration, sharing an existing HTTP client
    pub const fn new(client: Client, config: MokaConfig) -> Self {
        Self { client, config }
    }

    /// Create from configuration with a dedicated HTTP client
    pub fn from_config(config: MokaConfig) -> reqwest::Result<Self> {
        let client = crate::http::create_http_client(config.timeout)?;
        Ok(Self::new(client, config))
    }

    pub const fn config(&self) -> &MokaConfig {
        &self.config
    }

    /// POST the body and decode whatever JSON comes back
    async fn post(&self, body: &CreatePaymentBody<'_>) -> Result<Value> {
        let response = self
            .client
            .post(self.config.endpoint())
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        classify_status(response.status())?;

        response
            .json::<Value>()
            .await
            .map_err(|e| {
                let e = e.without_url();
                if e.is_timeout() {
                    PaymentError::UpstreamUnavailable(format!("Moka response timed out: {e}"))
                } else {
                    PaymentError::UpstreamProtocol(format!("Moka response is not JSON: {e}"))
                }
            })
    }
}

/// Map a failed send onto the error taxonomy
fn transport_error(e: reqwest::Error) -> PaymentError {
    let e = e.without_url();
    if e.is_builder() {
        PaymentError::UpstreamProtocol(format!("could not build Moka request: {e}"))
    } else {
        PaymentError::UpstreamUnavailable(format!("Moka unreachable: {e}"))
    }
}

/// Map a non-2xx status onto the error taxonomy
fn classify_status(status: StatusCode) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    let message = format!("Moka returned HTTP {status}");
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            PaymentError::AuthenticationFailed(message)
        }
        StatusCode::TOO_MANY_REQUESTS => PaymentError::UpstreamUnavailable(message),
        s if s.is_server_error() => PaymentError::UpstreamUnavailable(message),
        s if s.is_client_error() => PaymentError::RequestRejected(message),
        _ => PaymentError::UpstreamProtocol(message),
    })
}

#[async_trait]
impl PaymentProvider for MokaProvider {
    fn name(&self) -> &str {
        "moka"
    }

    #[instrument(
        name = "moka.create_payment_link",
        skip_all,
        fields(amount = %request.amount, currency = %request.currency)
    )]
    async fn create_payment_link(
        &self,
        credentials: &Credentials,
        request: &PaymentLinkRequest,
    ) -> Result<PaymentLink> {
        let body = CreatePaymentBody::build(credentials, request);
        debug!(other_trx_code = body.other_trx_code(), "Sending CreateUserPosPayment");

        let raw = self.post(&body).await.inspect_err(|e| {
            warn!(kind = %e.kind(), "Moka call failed");
        })?;

        interpret_response(raw, body.other_trx_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paylink_core::ErrorKind;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds() -> Credentials {
        Credentials::from_config("D100", "api-user", "s3cret", "2").unwrap()
    }

    fn provider_for(server: &MockServer) -> MokaProvider {
        MokaProvider::from_config(MokaConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    async fn call_with(template: ResponseTemplate) -> Result<PaymentLink> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CREATE_PAYMENT_PATH))
            .respond_with(template)
            .mount(&server)
            .await;
        provider_for(&server)
            .create_payment_link(&creds(), &PaymentLinkRequest::new(dec!(150)))
            .await
    }

    #[test]
    fn test_config_defaults() {
        let config = MokaConfig::default();
        assert_eq!(config.base_url, PRODUCTION_URL);
        assert_eq!(
            MokaConfig::new("https://x.test/").endpoint(),
            "https://x.test/PaymentUserPos/CreateUserPosPayment"
        );
        assert_eq!(MokaConfig::sandbox().base_url, TEST_URL);
    }

    #[test]
    fn test_status_classification() {
        let kind = |s: u16| classify_status(StatusCode::from_u16(s).unwrap()).unwrap_err().kind();
        assert!(classify_status(StatusCode::OK).is_ok());
        assert_eq!(kind(401), ErrorKind::AuthenticationFailed);
        assert_eq!(kind(403), ErrorKind::AuthenticationFailed);
        assert_eq!(kind(400), ErrorKind::RequestRejected);
        assert_eq!(kind(429), ErrorKind::UpstreamUnavailable);
        assert_eq!(kind(503), ErrorKind::UpstreamUnavailable);
    }

    #[tokio::test]
    async fn test_success_returns_link() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CREATE_PAYMENT_PATH))
            .and(body_partial_json(json!({
                "DealerAuthentication": {"DealerCode": "D100", "CheckKey": check_key(&creds())},
                "PaymentUserPosRequest": {
                    "Amount": "150.00",
                    "Currency": "TL",
                    "DealerCustomerTypeId": "2"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Data": {"Url": "https://pay.moka.test/l/abc", "CodeForHash": "H-77"},
                "ResultCode": "Success",
                "ResultMessage": "",
                "Exception": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let link = provider_for(&server)
            .create_payment_link(&creds(), &PaymentLinkRequest::new(dec!(150)))
            .await
            .unwrap();

        assert_eq!(link.link_url, "https://pay.moka.test/l/abc");
        assert_eq!(link.provider_reference.as_deref(), Some("H-77"));
        assert!(link.raw_provider_payload.is_some());
    }

    #[tokio::test]
    async fn test_auth_result_code() {
        let err = call_with(ResponseTemplate::new(200).set_body_json(json!({
            "Data": null,
            "ResultCode": "PaymentDealer.CheckPaymentDealerAuthentication.InvalidAccount",
            "ResultMessage": "",
        })))
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
        assert!(!err.message().contains("s3cret"));
    }

    #[tokio::test]
    async fn test_business_rejection() {
        let err = call_with(ResponseTemplate::new(200).set_body_json(json!({
            "Data": null,
            "ResultCode": "PaymentDealer.DoDirectPayment.InvalidCurrencyCode",
        })))
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestRejected);
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_server_error_is_retryable() {
        let err = call_with(ResponseTemplate::new(502)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_forbidden_is_auth_failure() {
        let err = call_with(ResponseTemplate::new(403)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let err = call_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamProtocolError);
    }

    #[tokio::test]
    async fn test_slow_gateway_times_out() {
        let err = call_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(5))
                .set_body_json(json!({"ResultCode": "Success"})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    }

    #[tokio::test]
    async fn test_unreachable_gateway() {
        let provider = MokaProvider::from_config(MokaConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_secs(2),
        })
        .unwrap();
        let err = provider
            .create_payment_link(&creds(), &PaymentLinkRequest::new(dec!(1)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    }
}
