//! HTTP mapping for [`VigilError`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use vigil_core::error::{ClientCode, VigilError};

/// Handler-facing error; renders as `{"error": ..., "code": <status>}`.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub VigilError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.client_code() {
            ClientCode::BadRequest => StatusCode::BAD_REQUEST,
            ClientCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal detail (registry or handler faults) stays in the logs.
        let msg = match self.0.client_code() {
            ClientCode::Internal => "Internal server error".to_string(),
            ClientCode::Timeout => "Request timed out".to_string(),
            ClientCode::BadRequest => self.0.to_string(),
        };
        if self.0.is_registry_error() {
            tracing::error!(error = %self.0, "instrumentation error reached a handler");
        }
        (status, Json(json!({ "error": msg, "code": status.as_u16() }))).into_response()
    }
}
