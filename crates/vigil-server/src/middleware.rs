//! Request instrumentation middleware.
//!
//! Every request gets a [`RequestGuard`]. The normal path calls
//! [`RequestGuard::finish`] with the response status; if the handler panics
//! or the request future is dropped, the guard's `Drop` records the outcome
//! instead, so each request is counted exactly once on every exit path.

use std::time::{Duration, Instant};

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use vigil_core::error::VigilError;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::obs::http::UNMATCHED_ROUTE;

/// nginx's "client closed request"; used when the request future is dropped.
const STATUS_CLIENT_CLOSED: u16 = 499;
const STATUS_PANICKED: u16 = 500;

pub async fn instrument(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());
    let guard = RequestGuard::start(state.clone(), req.method().as_str().to_owned(), route);

    let response = match tokio::time::timeout(state.request_timeout(), next.run(req)).await {
        Ok(resp) => resp,
        Err(_) => {
            tracing::warn!(
                route = %guard.route,
                timeout_ms = state.cfg().server.request_timeout_ms,
                "request timed out"
            );
            ApiError(VigilError::Timeout).into_response()
        }
    };

    guard.finish(response.status().as_u16());
    response
}

/// Scoped request measurement. Records on `finish` or, failing that, on drop.
pub struct RequestGuard {
    state: AppState,
    method: String,
    route: String,
    start: Instant,
    done: bool,
}

impl RequestGuard {
    pub fn start(state: AppState, method: String, route: String) -> Self {
        state.http_metrics().started();
        Self {
            state,
            method,
            route,
            start: Instant::now(),
            done: false,
        }
    }

    pub fn finish(mut self, status: u16) {
        self.record(status, self.start.elapsed());
    }

    fn record(&mut self, status: u16, elapsed: Duration) {
        if self.done {
            return;
        }
        self.done = true;
        self.state
            .http_metrics()
            .finished(&self.method, &self.route, status, elapsed);
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let status = if std::thread::panicking() {
            tracing::error!(route = %self.route, "handler panicked");
            STATUS_PANICKED
        } else {
            tracing::debug!(route = %self.route, "request dropped before completion");
            STATUS_CLIENT_CLOSED
        };
        let elapsed = self.start.elapsed();
        self.record(status, elapsed);
    }
}
