//! Gateway module - HTTP surface of the remote executor
//!
//! ```text
//!   GET  /api?token=&action=&path=&content=&command=
//!   POST /api   (JSON, form-encoded or text/plain body)
//!          │
//!          ▼
//!   params::RequestParams ──► Dispatcher ──► SandboxRoot::resolve
//!                                 │                 │
//!                                 ▼                 ▼
//!                           ApiResponse ◄──── ActionExecutor
//! ```
//!
//! Both `/api` routes feed the same [`Dispatcher`]; the only difference
//! between them is how the parameter record is built.

mod dispatcher;
mod params;
mod response;

pub use dispatcher::Dispatcher;
pub use params::{RequestParams, Transport};
pub use response::ApiResponse;

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::sandbox::SandboxRoot;

/// Create the sandbox root and a dispatcher for it
pub async fn prepare(config: &Config) -> Result<Arc<Dispatcher>> {
    let base_dir = config
        .sandbox
        .base_dir
        .as_ref()
        .ok_or_else(|| Error::Config("BASE_DIR must be set".to_string()))?;

    let root = SandboxRoot::prepare(base_dir).await?;
    Ok(Arc::new(Dispatcher::from_config(config, root)?))
}

/// Build the gateway router
pub fn build_router(dispatcher: Arc<Dispatcher>, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/api", get(api_get).post(api_post))
        .route("/health", get(health_check))
        .with_state(dispatcher)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .layer(TraceLayer::new_for_http())
}

async fn api_get(
    State(dispatcher): State<Arc<Dispatcher>>,
    RawQuery(query): RawQuery,
) -> ApiResponse {
    let params = RequestParams::from_query(query.as_deref());
    dispatcher.handle(params).await
}

async fn api_post(
    State(dispatcher): State<Arc<Dispatcher>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    match RequestParams::from_body(content_type, query.as_deref(), &body) {
        Ok(params) => dispatcher.handle(params).await,
        Err(e) => ApiResponse::from_error(&e),
    }
}

/// Health check
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "service": crate::NAME,
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}
