//! Immutable point-in-time view of a [`Registry`](crate::Registry).
//!
//! Families are sorted by name and series by label set, so a snapshot of an
//! unchanged registry always iterates in the same order.

use crate::metric::{Labels, MetricKind};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub families: Vec<FamilySnapshot>,
}

impl Snapshot {
    pub fn family(&self, name: &str) -> Option<&FamilySnapshot> {
        self.families.iter().find(|f| f.name == name)
    }

    /// Sum of all series of a counter family (0 when absent).
    pub fn counter_total(&self, name: &str) -> u64 {
        let Some(family) = self.family(name) else { return 0; };
        family
            .series
            .iter()
            .filter_map(|s| match s.value {
                SeriesValue::Counter(v) => Some(v),
                _ => None,
            })
            .fold(0u64, u64::saturating_add)
    }
}

/// All series sharing one metric name.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilySnapshot {
    pub name: String,
    pub kind: MetricKind,
    pub help: Option<String>,
    pub series: Vec<Series>,
}

impl FamilySnapshot {
    pub fn get(&self, labels: &Labels) -> Option<&SeriesValue> {
        self.series.iter().find(|s| &s.labels == labels).map(|s| &s.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub labels: Labels,
    pub value: SeriesValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesValue {
    Counter(u64),
    Gauge(f64),
    Histogram(HistogramSnapshot),
}

/// Histogram state copied under its lock.
///
/// `buckets` holds `(upper_bound, cumulative_count)` ascending by bound; the
/// implicit `+Inf` bucket equals `count`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    pub buckets: Vec<(f64, u64)>,
    pub sum: f64,
    pub count: u64,
}
