//! HTTP request metrics.
//!
//! Series are keyed by request labels that are only known at request time, so
//! they are registered lazily; registration is idempotent and cheap after the
//! first hit. Recording never fails the request: registry errors are logged.

use std::sync::Arc;
use std::time::Duration;

use vigil_core::error::Result;
use vigil_core::{InstrumentHandle, MetricId, Registry};

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_DURATION: &str = "http_request_duration_seconds";
pub const REQUESTS_IN_FLIGHT: &str = "http_requests_in_flight";

/// Route label for requests that matched no route.
pub const UNMATCHED_ROUTE: &str = "unmatched";

pub struct HttpMetrics {
    registry: Arc<Registry>,
    buckets: Vec<f64>,
    in_flight: InstrumentHandle,
}

impl HttpMetrics {
    pub fn new(registry: Arc<Registry>, buckets: &[f64]) -> Result<Self> {
        registry.describe(
            REQUESTS_TOTAL,
            "Completed HTTP requests by method, route and status class.",
        );
        registry.describe(REQUEST_DURATION, "HTTP request latency in seconds by route.");
        registry.describe(REQUESTS_IN_FLIGHT, "HTTP requests currently being served.");

        let in_flight = registry.register(MetricId::gauge(REQUESTS_IN_FLIGHT))?;
        Ok(Self {
            registry,
            buckets: buckets.to_vec(),
            in_flight,
        })
    }

    pub fn started(&self) {
        if let Err(e) = self.registry.add(&self.in_flight, 1.0) {
            tracing::warn!(error = %e, "failed to update in-flight gauge");
        }
    }

    /// Record one finished request: counter first, then the latency histogram.
    pub fn finished(&self, method: &str, route: &str, status: u16, elapsed: Duration) {
        if let Err(e) = self.registry.add(&self.in_flight, -1.0) {
            tracing::warn!(error = %e, "failed to update in-flight gauge");
        }

        let method = method_label(method);
        let counter = MetricId::counter(REQUESTS_TOTAL)
            .with_label("method", method)
            .with_label("route", route)
            .with_label("status_class", status_class(status));
        if let Err(e) = self
            .registry
            .register(counter)
            .and_then(|h| self.registry.inc(&h))
        {
            tracing::error!(
                error = %e, %method, %route, status,
                "failed to record request counter"
            );
        }

        let histogram = MetricId::histogram(REQUEST_DURATION).with_label("route", route);
        if let Err(e) = self
            .registry
            .register_histogram(histogram, &self.buckets)
            .and_then(|h| self.registry.observe(&h, elapsed.as_secs_f64()))
        {
            tracing::warn!(error = %e, %route, "failed to record request latency");
        }
    }

    /// Requests completed so far, across all label sets.
    pub fn total_requests(&self) -> u64 {
        self.registry.counter_total(REQUESTS_TOTAL)
    }
}

/// Collapse the request method onto a closed set so clients cannot mint new
/// series with arbitrary method tokens.
pub fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "PATCH" => "PATCH",
        "OPTIONS" => "OPTIONS",
        _ => "other",
    }
}

/// `2xx`-style class of an HTTP status code.
pub fn status_class(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes() {
        assert_eq!(status_class(200), "2xx");
        assert_eq!(status_class(204), "2xx");
        assert_eq!(status_class(301), "3xx");
        assert_eq!(status_class(499), "4xx");
        assert_eq!(status_class(504), "5xx");
        assert_eq!(status_class(42), "unknown");
    }

    #[test]
    fn methods() {
        assert_eq!(method_label("GET"), "GET");
        assert_eq!(method_label("OPTIONS"), "OPTIONS");
        assert_eq!(method_label("get"), "other");
        assert_eq!(method_label("X42"), "other");
        assert_eq!(method_label("CONNECT"), "other");
    }

    #[test]
    fn latency_failure_keeps_counter() {
        let reg = Arc::new(Registry::new());
        // Claim the latency family with a layout the metrics will not match.
        reg.register_histogram(
            MetricId::histogram(REQUEST_DURATION).with_label("route", "/other"),
            &[5.0],
        )
        .expect("pre-registered");
        let m = HttpMetrics::new(Arc::clone(&reg), &[0.1, 1.0]).expect("metrics");

        m.started();
        m.finished("GET", "/health", 200, Duration::from_millis(20));

        assert_eq!(m.total_requests(), 1);
        let snap = reg.snapshot();
        let lat = snap.family(REQUEST_DURATION).expect("latency family");
        assert_eq!(lat.series.len(), 1);
        assert_eq!(lat.series[0].labels.get("route").map(String::as_str), Some("/other"));
    }

    #[test]
    fn records_counter_and_histogram() {
        let reg = Arc::new(Registry::new());
        let m = HttpMetrics::new(Arc::clone(&reg), &[0.1, 1.0]).expect("metrics");

        m.started();
        m.finished("GET", "/health", 200, Duration::from_millis(20));
        m.started();
        m.finished("GET", "/health", 503, Duration::from_millis(300));

        assert_eq!(m.total_requests(), 2);
        let snap = reg.snapshot();
        let lat = snap.family(REQUEST_DURATION).expect("latency family");
        assert_eq!(lat.series.len(), 1);
        let counters = snap.family(REQUESTS_TOTAL).expect("counter family");
        assert_eq!(counters.series.len(), 2);
        assert_eq!(
            snap.family(REQUESTS_IN_FLIGHT).and_then(|f| f.series.first()).map(|s| &s.value),
            Some(&vigil_core::SeriesValue::Gauge(0.0))
        );
    }
}
