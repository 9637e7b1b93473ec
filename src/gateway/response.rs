//! HTTP response shaping
//!
//! Field names (`success`, `contentLength`, `files`, `stdout`, ...) are the
//! wire format existing callers depend on.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::error::Error;
use crate::sandbox::ShellOutput;

/// A response produced by the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// JSON body with a status code
    Json { status: StatusCode, body: Value },
    /// Raw `text/plain` body with status 200
    Text(String),
}

impl ApiResponse {
    /// `{error: message}` with the given status
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        ApiResponse::Json {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    /// Map an error to its status code, exposing its message verbatim
    pub fn from_error(err: &Error) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::error(status, err.to_string())
    }

    pub fn written(user_path: Option<&str>, bytes: usize) -> Self {
        Self::ok(json!({
            "success": true,
            "message": format!("File written to {}", user_path.unwrap_or_default()),
            "contentLength": bytes,
        }))
    }

    pub fn read_json(content: String) -> Self {
        Self::ok(json!({ "success": true, "content": content }))
    }

    pub fn listed(files: Vec<String>) -> Self {
        Self::ok(json!({ "success": true, "files": files }))
    }

    pub fn shell(output: &ShellOutput) -> Self {
        Self::ok(serde_json::to_value(output).unwrap_or_default())
    }

    fn ok(body: Value) -> Self {
        ApiResponse::Json {
            status: StatusCode::OK,
            body,
        }
    }

    /// HTTP status of this response
    pub fn status(&self) -> StatusCode {
        match self {
            ApiResponse::Json { status, .. } => *status,
            ApiResponse::Text(_) => StatusCode::OK,
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Json { status, body } => (status, Json(body)).into_response(),
            ApiResponse::Text(content) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                content,
            )
                .into_response(),
        }
    }
}
