//! Simulated workloads: injected failures, injected latency and fake system
//! readings. All randomness goes through a [`RandomSource`].

pub mod handlers;
pub mod random;

use std::sync::Arc;
use std::time::Duration;

use vigil_core::error::Result;
use vigil_core::{InstrumentHandle, MetricId, Registry};

use crate::config::SimulateSection;

pub use random::{RandomSource, ScriptedRandom, SeededRandom};

pub const SIMULATED_ERRORS: &str = "simulated_errors_total";

pub struct Simulator {
    rng: Arc<dyn RandomSource>,
    fail_probability: f64,
    slow_min: Duration,
    slow_max: Duration,
    registry: Arc<Registry>,
    injected_errors: InstrumentHandle,
}

/// Fake host readings served by `/metrics-raw`.
#[derive(Debug, Clone, Copy)]
pub struct SystemSample {
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

impl Simulator {
    pub fn new(
        cfg: &SimulateSection,
        rng: Arc<dyn RandomSource>,
        registry: Arc<Registry>,
    ) -> Result<Self> {
        registry.describe(SIMULATED_ERRORS, "Failures injected by /simulate/error.");
        let injected_errors = registry.register(MetricId::counter(SIMULATED_ERRORS))?;
        Ok(Self {
            rng,
            fail_probability: cfg.fail_probability,
            slow_min: Duration::from_millis(cfg.slow_min_ms),
            slow_max: Duration::from_millis(cfg.slow_max_ms),
            registry,
            injected_errors,
        })
    }

    /// Draw once; `true` when the draw falls below the failure probability.
    pub fn should_fail(&self) -> bool {
        let fail = self.rng.next_f64() < self.fail_probability;
        if fail {
            if let Err(e) = self.registry.inc(&self.injected_errors) {
                tracing::warn!(error = %e, "failed to count simulated error");
            }
        }
        fail
    }

    /// Delay drawn uniformly from the configured range.
    pub fn slow_delay(&self) -> Duration {
        let span = self.slow_max.saturating_sub(self.slow_min);
        self.slow_min + span.mul_f64(self.rng.next_f64())
    }

    pub fn system_sample(&self) -> SystemSample {
        SystemSample {
            cpu_percent: self.uniform(10.0, 80.0),
            memory_percent: self.uniform(30.0, 70.0),
        }
    }

    fn uniform(&self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.rng.next_f64()
    }
}

/// Round for display (`places` decimal digits).
pub fn round_to(v: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (v * f).round() / f
}
