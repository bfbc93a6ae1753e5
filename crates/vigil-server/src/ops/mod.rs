//! Operational HTTP endpoints.
//!
//! - `/`            : service info
//! - `/health`      : liveness with uptime and request count
//! - `/metrics`     : Prometheus text format
//! - `/metrics-raw` : simulated host readings as JSON

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use vigil_core::exposition::{self, CONTENT_TYPE};

use crate::app_state::AppState;
use crate::simulate::round_to;

pub async fn root() -> Json<Value> {
    Json(json!({
        "app": "vigil",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// `total_requests` counts requests completed before this one.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": round_to(state.process().uptime_seconds(), 2),
        "total_requests": state.http_metrics().total_requests()
    }))
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    state.process().refresh();
    let body = exposition::encode(&state.registry().snapshot());

    (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response()
}

pub async fn metrics_raw(State(state): State<AppState>) -> Json<Value> {
    let sample = state.simulator().system_sample();
    Json(json!({
        "cpu_percent": round_to(sample.cpu_percent, 2),
        "memory_percent": round_to(sample.memory_percent, 2),
        "uptime_seconds": round_to(state.process().uptime_seconds(), 2),
        "request_count": state.http_metrics().total_requests()
    }))
}
