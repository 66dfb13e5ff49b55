//! Multi-tenant HTTP transport tests.
//!
//! Drive the real router with `oneshot`; a recording provider stands in for
//! the gateway.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use paylink_core::{
    Credentials, Dispatcher, PaymentError, PaymentLink, PaymentLinkRequest, PaymentProvider,
    ProviderResolver, Result,
};
use paylink_providers::ProviderKind;
use paylink_server::{mcp::McpService, state::AppState, transport::router};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Records what each invocation saw
#[derive(Default)]
struct RecordingProvider {
    calls: Mutex<Vec<(String, Option<String>)>>,
    delay: Option<Duration>,
}

impl RecordingProvider {
    fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProvider for RecordingProvider {
    fn name(&self) -> &str {
        "moka"
    }

    async fn create_payment_link(
        &self,
        credentials: &Credentials,
        request: &PaymentLinkRequest,
    ) -> Result<PaymentLink> {
        self.calls
            .lock()
            .unwrap()
            .push((credentials.dealer_code().to_string(), request.other_trx_code.clone()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        Ok(PaymentLink {
            link_url: format!("https://pay.test/{}", credentials.dealer_code()),
            provider_reference: request.other_trx_code.clone(),
            raw_provider_payload: None,
        })
    }
}

struct OnlyMoka(Arc<RecordingProvider>);

impl ProviderResolver for OnlyMoka {
    fn resolve(&self, name: &str) -> Result<Arc<dyn PaymentProvider>> {
        if name.trim().eq_ignore_ascii_case("moka") {
            Ok(self.0.clone())
        } else {
            Err(PaymentError::UnknownProvider(format!("'{name}' is not supported")))
        }
    }
}

fn app_with(provider: Arc<RecordingProvider>, timeout: Duration) -> Router {
    let dispatcher = Dispatcher::new(Arc::new(OnlyMoka(provider))).with_upstream_timeout(timeout);
    router(AppState {
        service: Arc::new(McpService::new(Arc::new(dispatcher))),
        default_provider: ProviderKind::Moka,
    })
}

fn app(provider: Arc<RecordingProvider>) -> Router {
    app_with(provider, Duration::from_secs(5))
}

fn tool_call(id: u64, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": "create_payment_link", "arguments": arguments}
    })
}

const TENANT: &[(&str, &str)] = &[
    ("X-Dealer-Code", "D100"),
    ("X-Username", "api-user"),
    ("X-Password", "s3cret"),
    ("X-Customer-Type-ID", "2"),
];

async fn post_mcp(app: Router, headers: &[(&str, &str)], body: String) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json");
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let response = app
        .oneshot(request.body(Body::from(body)).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn call(app: Router, headers: &[(&str, &str)], arguments: Value) -> (StatusCode, Value) {
    post_mcp(app, headers, tool_call(1, arguments).to_string()).await
}

#[tokio::test]
async fn test_health_check() {
    let response = app(Arc::default())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "paylink-mcp");
    assert_eq!(json["provider"], "moka");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_create_link_success() {
    let provider = Arc::new(RecordingProvider::default());
    let (status, json) = call(
        app(provider.clone()),
        TENANT,
        json!({"amount": 150.0, "currency": "TL", "other_trx_code": "ORD-1"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let result = &json["result"];
    assert_eq!(result["isError"], false);
    assert_eq!(result["structuredContent"]["success"], true);
    assert_eq!(result["structuredContent"]["link_url"], "https://pay.test/D100");
    assert_eq!(result["structuredContent"]["provider_reference"], "ORD-1");
    assert_eq!(provider.calls().len(), 1);
}

#[tokio::test]
async fn test_negative_amount_never_reaches_provider() {
    let provider = Arc::new(RecordingProvider::default());
    let (status, json) = call(app(provider.clone()), TENANT, json!({"amount": -5})).await;

    assert_eq!(status, StatusCode::OK);
    let error = &json["result"]["structuredContent"]["error"];
    assert_eq!(error["kind"], "ValidationError");
    assert_eq!(error["retriable"], false);
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_missing_customer_type_id() {
    let provider = Arc::new(RecordingProvider::default());
    let (status, json) = call(app(provider.clone()), &TENANT[..3], json!({"amount": 10})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["result"]["isError"], true);
    let error = &json["result"]["structuredContent"]["error"];
    assert_eq!(error["kind"], "MissingCredentials");
    assert!(!error["message"].as_str().unwrap().contains("s3cret"));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_lowercase_alias_headers() {
    let provider = Arc::new(RecordingProvider::default());
    let headers = [
        ("dealercode", "D200"),
        ("username", "u"),
        ("password", "p"),
        ("customertypeid", "2"),
    ];
    let (_, json) = call(app(provider.clone()), &headers, json!({"amount": 10})).await;

    assert_eq!(json["result"]["isError"], false);
    assert_eq!(provider.calls()[0].0, "D200");
}

#[tokio::test]
async fn test_unknown_provider_before_missing_credentials() {
    let provider = Arc::new(RecordingProvider::default());
    let (status, json) = call(
        app(provider.clone()),
        &[("X-Payment-Provider", "paypal")],
        json!({"amount": 10}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["result"]["structuredContent"]["error"]["kind"], "UnknownProvider");
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_provider_timeout_is_retriable() {
    let provider = Arc::new(RecordingProvider {
        delay: Some(Duration::from_secs(2)),
        ..Default::default()
    });
    let (_, json) = call(
        app_with(provider, Duration::from_millis(50)),
        TENANT,
        json!({"amount": 10}),
    )
    .await;

    let error = &json["result"]["structuredContent"]["error"];
    assert_eq!(error["kind"], "UpstreamUnavailable");
    assert_eq!(error["retriable"], true);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tenants_stay_isolated() {
    let provider = Arc::new(RecordingProvider {
        delay: Some(Duration::from_millis(20)),
        ..Default::default()
    });
    let app = app(provider.clone());

    let requests = (0..16).map(|i| {
        let app = app.clone();
        async move {
            let dealer = format!("D{i}");
            let headers = [
                ("X-Dealer-Code", dealer.as_str()),
                ("X-Username", "u"),
                ("X-Password", "p"),
                ("X-Customer-Type-ID", "2"),
            ];
            let trx = format!("T{i}");
            let (_, json) = call(app, &headers, json!({"amount": 1, "other_trx_code": trx})).await;
            (dealer, json)
        }
    });
    let results = futures::future::join_all(requests).await;

    for (dealer, json) in results {
        assert_eq!(
            json["result"]["structuredContent"]["link_url"],
            format!("https://pay.test/{dealer}")
        );
    }
    let calls = provider.calls();
    assert_eq!(calls.len(), 16);
    for (dealer, trx) in calls {
        assert_eq!(dealer.trim_start_matches('D'), trx.unwrap().trim_start_matches('T'));
    }
}

#[tokio::test]
async fn test_notification_only_body_is_accepted() {
    let (status, json) = post_mcp(
        app(Arc::default()),
        &[],
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json, Value::Null);
}

#[tokio::test]
async fn test_null_id_tool_call_is_answered() {
    let provider = Arc::new(RecordingProvider::default());
    let mut message = tool_call(1, json!({"amount": 10}));
    message["id"] = Value::Null;
    let (status, json) = post_mcp(app(provider.clone()), TENANT, message.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], Value::Null);
    assert_eq!(json["error"]["code"], -32600);
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_sub_cent_amount_never_reaches_provider() {
    let provider = Arc::new(RecordingProvider::default());
    let (_, json) = call(app(provider.clone()), TENANT, json!({"amount": "10.015"})).await;

    assert_eq!(json["result"]["structuredContent"]["error"]["kind"], "ValidationError");
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let (status, json) = post_mcp(app(Arc::default()), &[], "{\"jsonrpc\":".into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], -32700);
}

#[tokio::test]
async fn test_batch_and_lifecycle_without_credentials() {
    let body = json!([
        {
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {"protocolVersion": "2025-03-26"}
        },
        {"jsonrpc": "2.0", "method": "notifications/initialized"},
        {"jsonrpc": "2.0", "id": 2, "method": "tools/list"}
    ]);
    let (status, json) = post_mcp(app(Arc::default()), &[], body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    let replies = json.as_array().unwrap();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(replies[1]["result"]["tools"][0]["name"], "create_payment_link");
}
