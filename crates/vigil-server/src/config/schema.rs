use std::time::Duration;

use serde::Deserialize;
use vigil_core::error::{Result, VigilError};
use vigil_core::metric::{validate_buckets, DEFAULT_BUCKETS};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub simulate: SimulateSection,

    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            simulate: SimulateSection::default(),
            metrics: MetricsSection::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(VigilError::BadRequest(format!(
                "unsupported config version: {}",
                self.version
            )));
        }
        self.server.validate()?;
        self.simulate.validate()?;
        self.metrics.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=600_000).contains(&self.request_timeout_ms) {
            return Err(VigilError::BadRequest(
                "server.request_timeout_ms must be between 1 and 600000".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulateSection {
    /// Probability that `/simulate/error` fails.
    #[serde(default = "default_fail_probability")]
    pub fail_probability: f64,

    #[serde(default = "default_slow_min_ms")]
    pub slow_min_ms: u64,

    #[serde(default = "default_slow_max_ms")]
    pub slow_max_ms: u64,

    /// Fixed RNG seed; OS entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulateSection {
    fn default() -> Self {
        Self {
            fail_probability: default_fail_probability(),
            slow_min_ms: default_slow_min_ms(),
            slow_max_ms: default_slow_max_ms(),
            seed: None,
        }
    }
}

impl SimulateSection {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.fail_probability) {
            return Err(VigilError::BadRequest(
                "simulate.fail_probability must be between 0 and 1".into(),
            ));
        }
        if self.slow_min_ms > self.slow_max_ms {
            return Err(VigilError::BadRequest(
                "simulate.slow_min_ms must not exceed slow_max_ms".into(),
            ));
        }
        if self.slow_max_ms > 600_000 {
            return Err(VigilError::BadRequest(
                "simulate.slow_max_ms must be at most 600000".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Upper bounds (seconds) of the request latency histogram.
    #[serde(default = "default_latency_buckets")]
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            latency_buckets: default_latency_buckets(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        validate_buckets(&self.latency_buckets)
            .map_err(|e| VigilError::BadRequest(format!("metrics.latency_buckets: {e}")))
    }
}

fn default_listen() -> String {
    "0.0.0.0:5000".into()
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_fail_probability() -> f64 {
    0.5
}
fn default_slow_min_ms() -> u64 {
    100
}
fn default_slow_max_ms() -> u64 {
    3_000
}
fn default_latency_buckets() -> Vec<f64> {
    DEFAULT_BUCKETS.to_vec()
}
