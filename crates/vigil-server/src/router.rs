//! Axum router wiring.
//!
//! Layer order, outermost first: request tracing, panic catching, then
//! instrumentation around every route (including the 404 fallback).

use axum::{middleware, routing::get, Router};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{app_state::AppState, ops, simulate};

pub fn build_router(state: AppState) -> Router {
    instrumented(routes(), state)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(ops::root))
        .route("/health", get(ops::health))
        .route("/metrics", get(ops::metrics))
        .route("/metrics-raw", get(ops::metrics_raw))
        .route("/simulate/error", get(simulate::handlers::error))
        .route("/simulate/slow", get(simulate::handlers::slow))
}

/// Wrap `routes` with the instrumentation stack and bind the state.
pub fn instrumented(routes: Router<AppState>, state: AppState) -> Router {
    routes
        .layer(middleware::from_fn_with_state(state.clone(), crate::middleware::instrument))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
