//! Dispatch Core
//!
//! Shared by both transports. A call moves through
//! `Received → Validated → CredentialsResolved → ProviderResolved → Invoked`
//! and ends `Succeeded` or `Failed`. Any failure short-circuits: the provider
//! is never invoked after an earlier stage failed, and nothing is retried here.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::Instrument;

use crate::credentials::Credentials;
use crate::error::{PaymentError, Result};
use crate::provider::{PaymentLink, PaymentLinkResult, PaymentProvider, ProviderResolver};
use crate::request::{self, PaymentLinkRequest};

/// Default bound on a single gateway call
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Progress of one call through the dispatcher
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallStage {
    Received,
    Validated,
    CredentialsResolved,
    ProviderResolved,
    Invoked,
    Succeeded,
    Failed,
}

impl std::fmt::Display for CallStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::CredentialsResolved => "credentials_resolved",
            Self::ProviderResolved => "provider_resolved",
            Self::Invoked => "invoked",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Provider name and credentials bound to one call by a transport.
///
/// Single-session transports build one at startup and clone it per call;
/// multi-tenant transports build a fresh one from every request.
#[derive(Clone, Debug)]
pub struct CallScope {
    provider: String,
    credentials: Credentials,
}

impl CallScope {
    pub fn new(provider: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            provider: provider.into(),
            credentials,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// Runs `create_payment_link` calls against resolved providers
pub struct Dispatcher {
    resolver: Arc<dyn ProviderResolver>,
    upstream_timeout: Duration,
}

impl Dispatcher {
    pub fn new(resolver: Arc<dyn ProviderResolver>) -> Self {
        Self {
            resolver,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn resolver(&self) -> &dyn ProviderResolver {
        self.resolver.as_ref()
    }

    /// Run one call.
    ///
    /// `scope` is whatever the transport could bind; a binding failure
    /// (missing credentials, unknown provider) is only reported after the
    /// arguments validated, so callers see argument problems first.
    #[tracing::instrument(
        name = "dispatch",
        skip_all,
        fields(call_id = %uuid::Uuid::new_v4(), provider = tracing::field::Empty)
    )]
    pub async fn dispatch(
        &self,
        scope: Result<CallScope>,
        arguments: &Map<String, Value>,
    ) -> PaymentLinkResult {
        let mut stage = CallStage::Received;
        let outcome = self.run(&mut stage, scope, arguments).await;

        match &outcome {
            Ok(_) => tracing::info!(stage = %CallStage::Succeeded, "payment link created"),
            Err(err) => tracing::warn!(
                stage = %CallStage::Failed,
                last_stage = %stage,
                kind = %err.kind(),
                retriable = err.is_retryable(),
                "payment link call failed: {}",
                err.message()
            ),
        }

        outcome.into()
    }

    async fn run(
        &self,
        stage: &mut CallStage,
        scope: Result<CallScope>,
        arguments: &Map<String, Value>,
    ) -> Result<PaymentLink> {
        let request = request::validate(arguments)?;
        *stage = CallStage::Validated;

        let CallScope { provider, credentials } = scope?;
        *stage = CallStage::CredentialsResolved;
        tracing::Span::current().record("provider", provider.as_str());

        let provider = self.resolver.resolve(&provider)?;
        *stage = CallStage::ProviderResolved;

        tracing::debug!(
            amount = %request.amount,
            currency = %request.currency,
            "invoking provider"
        );
        *stage = CallStage::Invoked;
        self.invoke(provider, credentials, request).await
    }

    /// Run the provider call in its own task, bounded by the upstream timeout.
    ///
    /// On timeout the task is detached rather than aborted: a gateway call
    /// that already left cannot be recalled, so it may still complete.
    async fn invoke(
        &self,
        provider: Arc<dyn PaymentProvider>,
        credentials: Credentials,
        request: PaymentLinkRequest,
    ) -> Result<PaymentLink> {
        let task = tokio::spawn(
            async move { provider.create_payment_link(&credentials, &request).await }
                .instrument(tracing::Span::current()),
        );

        match tokio::time::timeout(self.upstream_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(PaymentError::UpstreamProtocol(format!(
                "provider task failed: {join_err}"
            ))),
            Err(_) => Err(PaymentError::UpstreamUnavailable(format!(
                "provider did not answer within {:?}",
                self.upstream_timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every credential set it is called with
    #[derive(Default)]
    struct SpyProvider {
        calls: Mutex<Vec<(String, String, String)>>,
        delay: Option<Duration>,
    }

    impl SpyProvider {
        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PaymentProvider for SpyProvider {
        fn name(&self) -> &str {
            "spy"
        }

        async fn create_payment_link(
            &self,
            credentials: &Credentials,
            request: &PaymentLinkRequest,
        ) -> Result<PaymentLink> {
            let trx = request.other_trx_code.clone().unwrap_or_default();
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.calls.lock().unwrap().push((
                trx.clone(),
                credentials.dealer_code().to_string(),
                credentials.username().to_string(),
            ));
            Ok(PaymentLink {
                link_url: format!("https://pay.example/{trx}"),
                provider_reference: Some(format!("TX-{trx}")),
                raw_provider_payload: None,
            })
        }
    }

    struct SpyResolver(Arc<SpyProvider>);

    impl ProviderResolver for SpyResolver {
        fn resolve(&self, name: &str) -> Result<Arc<dyn PaymentProvider>> {
            if name.eq_ignore_ascii_case("spy") {
                Ok(self.0.clone())
            } else {
                Err(PaymentError::UnknownProvider(format!("'{name}' is not registered")))
            }
        }
    }

    fn setup(spy: SpyProvider) -> (Arc<SpyProvider>, Dispatcher) {
        let spy = Arc::new(spy);
        let dispatcher = Dispatcher::new(Arc::new(SpyResolver(spy.clone())));
        (spy, dispatcher)
    }

    fn scope(tenant: &str) -> Result<CallScope> {
        let creds = Credentials::from_config(
            &format!("dealer-{tenant}"),
            &format!("user-{tenant}"),
            "pw",
            "2",
        )?;
        Ok(CallScope::new("spy", creds))
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_invalid_amount_never_reaches_provider() {
        let (spy, dispatcher) = setup(SpyProvider::default());
        let cases = [
            json!({"amount": 0}),
            json!({"amount": -5}),
            json!({"amount": "ten"}),
            json!({"amount": "0.001"}),
            json!({}),
        ];
        for bad in cases {
            let result = dispatcher.dispatch(scope("a"), &args(bad)).await;
            assert_eq!(result.error().map(|e| e.kind()), Some(ErrorKind::ValidationError));
        }
        assert_eq!(spy.call_count(), 0);
    }

    #[tokio::test]
    async fn test_validation_reported_before_binding_failure() {
        let (spy, dispatcher) = setup(SpyProvider::default());
        let missing = Err(PaymentError::MissingCredentials("customer_type_id".into()));
        let result = dispatcher.dispatch(missing, &args(json!({"amount": -5}))).await;
        assert_eq!(result.error().map(|e| e.kind()), Some(ErrorKind::ValidationError));
        assert_eq!(spy.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_fast() {
        let (spy, dispatcher) = setup(SpyProvider::default());
        let missing = Err(PaymentError::MissingCredentials("customer_type_id".into()));
        let result = dispatcher.dispatch(missing, &args(json!({"amount": 10}))).await;
        assert_eq!(result.error().map(|e| e.kind()), Some(ErrorKind::MissingCredentials));
        assert_eq!(spy.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_provider_fails_fast() {
        let (spy, dispatcher) = setup(SpyProvider::default());
        let creds = Credentials::from_config("d", "u", "p", "2").unwrap();
        let result = dispatcher
            .dispatch(Ok(CallScope::new("iyzico", creds)), &args(json!({"amount": 10})))
            .await;
        let error = result.error().unwrap();
        assert_eq!(error.kind(), ErrorKind::UnknownProvider);
        assert!(!error.retriable());
        assert_eq!(spy.call_count(), 0);
    }

    #[tokio::test]
    async fn test_success_relayed_unchanged() {
        let (spy, dispatcher) = setup(SpyProvider::default());
        let result = dispatcher
            .dispatch(
                scope("a"),
                &args(json!({"amount": 150.0, "currency": "TL", "other_trx_code": "abc"})),
            )
            .await;
        assert!(result.is_success());
        assert_eq!(result.link_url(), Some("https://pay.example/abc"));
        assert_eq!(result.provider_reference(), Some("TX-abc"));
        assert_eq!(spy.call_count(), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_retriable_upstream_unavailable() {
        let (_spy, dispatcher) = setup(SpyProvider {
            delay: Some(Duration::from_millis(500)),
            ..Default::default()
        });
        let dispatcher = dispatcher.with_upstream_timeout(Duration::from_millis(20));

        let result = dispatcher.dispatch(scope("a"), &args(json!({"amount": 10}))).await;
        let error = result.error().unwrap();
        assert_eq!(error.kind(), ErrorKind::UpstreamUnavailable);
        assert!(error.retriable());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calls_keep_their_own_credentials() {
        let (spy, dispatcher) = setup(SpyProvider {
            delay: Some(Duration::from_millis(5)),
            ..Default::default()
        });

        let calls = (0..32).map(|i| {
            let tenant = i.to_string();
            let arguments = args(json!({"amount": 10 + i, "other_trx_code": tenant}));
            let dispatcher = &dispatcher;
            async move { dispatcher.dispatch(scope(&tenant), &arguments).await }
        });
        let results = futures::future::join_all(calls).await;
        assert!(results.iter().all(PaymentLinkResult::is_success));

        let calls = spy.calls.lock().unwrap();
        assert_eq!(calls.len(), 32);
        for (trx, dealer, user) in calls.iter() {
            assert_eq!(dealer, &format!("dealer-{trx}"));
            assert_eq!(user, &format!("user-{trx}"));
        }
    }
}
