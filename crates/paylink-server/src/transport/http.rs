//! Multi-tenant transport: MCP over HTTP POST.
//!
//! Each request is bound to the provider and credentials in its own headers.
//! Tool failures travel inside a 200 response; only an unparseable body
//! produces a non-2xx status.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use super::tenant::TenantBinder;
use crate::mcp::{JsonRpcError, JsonRpcResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub provider: &'static str,
}

/// Liveness only: never calls a gateway
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "paylink-mcp",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.default_provider.as_str(),
    })
}

/// One JSON-RPC message or batch per POST
pub async fn mcp_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let message: Value = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::failure(Value::Null, JsonRpcError::parse_error(e))),
            )
                .into_response();
        }
    };

    let binder = TenantBinder::new(
        &headers,
        state.default_provider.as_str(),
        state.service.dispatcher().resolver(),
    );

    match state.service.handle_message(message, &binder).await {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/mcp", post(mcp_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve_http(state: AppState, host: &str, port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;

    info!(
        addr = %listener.local_addr()?,
        provider = state.default_provider.as_str(),
        "Serving MCP over HTTP (POST /mcp, GET /health)"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
