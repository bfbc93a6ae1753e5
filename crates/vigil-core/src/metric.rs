//! Metric identity: name, label set and instrument kind.
//!
//! Labels are kept in a `BTreeMap` so a label set has exactly one ordering;
//! two identities built with the same labels in a different order are equal
//! and render identically.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, VigilError};

/// Sorted label set (`key -> value`).
pub type Labels = BTreeMap<String, String>;

/// Default latency buckets in seconds (5ms .. 10s).
pub const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    /// Name used on the `# TYPE` line.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one time series. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricId {
    pub name: String,
    pub labels: Labels,
    pub kind: MetricKind,
}

impl MetricId {
    pub fn new(name: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            name: name.into(),
            labels: Labels::new(),
            kind,
        }
    }

    pub fn counter(name: impl Into<String>) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    pub fn gauge(name: impl Into<String>) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    pub fn histogram(name: impl Into<String>) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    /// Add (or replace) one label.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Check the metric name and label names against the exposition grammar.
    pub fn validate(&self) -> Result<()> {
        if !is_metric_name(&self.name) {
            return Err(VigilError::InvalidName(format!(
                "metric name {:?} must match [a-zA-Z_:][a-zA-Z0-9_:]*",
                self.name
            )));
        }
        for key in self.labels.keys() {
            if !is_label_name(key) || key.starts_with("__") {
                return Err(VigilError::InvalidName(format!(
                    "label name {key:?} on {} is not a valid label name",
                    self.name
                )));
            }
            if self.kind == MetricKind::Histogram && key == "le" {
                return Err(VigilError::InvalidName(format!(
                    "label \"le\" is reserved on histogram {}",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

fn is_metric_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn is_label_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Bucket upper bounds must be non-empty, finite and strictly ascending.
/// `+Inf` is implicit and must not be listed.
pub fn validate_buckets(bounds: &[f64]) -> Result<()> {
    if bounds.is_empty() {
        return Err(VigilError::InvalidBuckets("at least one bucket bound is required".into()));
    }
    if let Some(b) = bounds.iter().find(|b| !b.is_finite()) {
        return Err(VigilError::InvalidBuckets(format!("bound {b} is not finite")));
    }
    if let Some(w) = bounds.windows(2).find(|w| w[0] >= w[1]) {
        return Err(VigilError::InvalidBuckets(format!(
            "bounds must be strictly ascending ({} >= {})",
            w[0], w[1]
        )));
    }
    Ok(())
}
