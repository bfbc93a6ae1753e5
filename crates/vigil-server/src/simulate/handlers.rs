//! `/simulate/*` endpoints.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use vigil_core::error::VigilError;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::simulate::round_to;

/// Fails with 500 with the configured probability.
pub async fn error(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if state.simulator().should_fail() {
        tracing::warn!("simulated handler failure");
        return Err(VigilError::Handler("simulated failure".into()).into());
    }
    Ok(Json(json!({
        "status": "ok",
        "message": "No error this time"
    })))
}

/// Sleeps for a random delay before answering. The sleep yields to the
/// runtime and holds no registry state.
pub async fn slow(State(state): State<AppState>) -> Json<Value> {
    let delay = state.simulator().slow_delay();
    tracing::debug!(delay_ms = delay.as_millis() as u64, "simulating slow response");
    tokio::time::sleep(delay).await;
    Json(json!({
        "status": "ok",
        "response_time_seconds": round_to(delay.as_secs_f64(), 3)
    }))
}
