use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use vigil_core::error::Result;
use vigil_core::{InstrumentHandle, MetricId, Registry};

pub const START_TIME: &str = "process_start_time_seconds";
pub const UPTIME: &str = "process_uptime_seconds";

/// Process lifetime gauges. Uptime is measured on the monotonic clock from
/// `started`; only the start timestamp uses wall-clock time.
pub struct ProcessMetrics {
    registry: Arc<Registry>,
    started: Instant,
    uptime: InstrumentHandle,
}

impl ProcessMetrics {
    pub fn new(registry: Arc<Registry>) -> Result<Self> {
        registry.describe(START_TIME, "Start time of the process since unix epoch in seconds.");
        registry.describe(UPTIME, "Seconds since the process started.");

        let start = registry.register(MetricId::gauge(START_TIME))?;
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        registry.set(&start, wall)?;

        let uptime = registry.register(MetricId::gauge(UPTIME))?;
        Ok(Self {
            registry,
            started: Instant::now(),
            uptime,
        })
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Update the uptime gauge; called right before a scrape is encoded.
    pub fn refresh(&self) {
        if let Err(e) = self.registry.set(&self.uptime, self.uptime_seconds()) {
            tracing::warn!(error = %e, "failed to refresh uptime gauge");
        }
    }
}
