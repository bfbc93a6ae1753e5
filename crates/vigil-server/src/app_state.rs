//! Shared application state for the vigil server.
//!
//! The registry and every instrument handle are created here, once, at
//! startup. Registration failures are programmer errors and abort boot.

use std::sync::Arc;
use std::time::Duration;

use vigil_core::error::Result;
use vigil_core::Registry;

use crate::config::ServerConfig;
use crate::obs::{HttpMetrics, ProcessMetrics};
use crate::simulate::{RandomSource, SeededRandom, Simulator};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServerConfig,
    registry: Arc<Registry>,
    http: HttpMetrics,
    process: ProcessMetrics,
    simulator: Simulator,
}

impl AppState {
    /// Build application state with the RNG described by `simulate.seed`.
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        let rng = Arc::new(SeededRandom::new(cfg.simulate.seed));
        Self::with_random(cfg, rng)
    }

    /// Build application state with an explicit randomness source.
    pub fn with_random(cfg: ServerConfig, rng: Arc<dyn RandomSource>) -> Result<Self> {
        let registry = Arc::new(Registry::with_default_buckets(&cfg.metrics.latency_buckets)?);

        let http = HttpMetrics::new(Arc::clone(&registry), &cfg.metrics.latency_buckets)?;
        let process = ProcessMetrics::new(Arc::clone(&registry))?;
        let simulator = Simulator::new(&cfg.simulate, rng, Arc::clone(&registry))?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                http,
                process,
                simulator,
            }),
        })
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn http_metrics(&self) -> &HttpMetrics {
        &self.inner.http
    }

    pub fn process(&self) -> &ProcessMetrics {
        &self.inner.process
    }

    pub fn simulator(&self) -> &Simulator {
        &self.inner.simulator
    }

    pub fn request_timeout(&self) -> Duration {
        self.inner.cfg.server.request_timeout()
    }
}
