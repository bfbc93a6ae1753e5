//! In-process metric registry.
//!
//! The registry exclusively owns instrument state. Callers receive an
//! [`InstrumentHandle`] (an opaque slot id) from [`Registry::register`] and
//! record through the registry, never through references into its storage.
//!
//! Concurrency:
//! - series index and slots live in `DashMap`s; shard locks are held only for
//!   the duration of one lookup
//! - counters and gauges are atomics (CAS loops for checked/f64 adds)
//! - each histogram sits behind its own `Mutex`, so a snapshot copies it whole
//!   and never observes a half-applied observation

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::Ref;
use dashmap::DashMap;

use crate::error::{Result, VigilError};
use crate::metric::{validate_buckets, Labels, MetricId, MetricKind, DEFAULT_BUCKETS};
use crate::snapshot::{FamilySnapshot, HistogramSnapshot, Series, SeriesValue, Snapshot};

/// Opaque reference to one registered series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstrumentHandle {
    slot: u64,
    kind: MetricKind,
}

impl InstrumentHandle {
    pub fn kind(&self) -> MetricKind {
        self.kind
    }
}

/// Per-name metadata. A name keeps its kind (and bucket layout) for the
/// registry's lifetime, even after its last series is unregistered.
struct Family {
    kind: MetricKind,
    buckets: Option<Arc<[f64]>>,
}

struct Slot {
    id: MetricId,
    instrument: Instrument,
}

enum Instrument {
    Counter(AtomicU64),
    /// f64 stored as raw bits.
    Gauge(AtomicU64),
    Histogram(Mutex<HistogramState>),
}

struct HistogramState {
    bounds: Arc<[f64]>,
    /// Cumulative: `buckets[i]` counts observations `<= bounds[i]`.
    buckets: Vec<u64>,
    sum: f64,
    count: u64,
}

impl HistogramState {
    fn new(bounds: Arc<[f64]>) -> Self {
        Self {
            buckets: vec![0; bounds.len()],
            bounds,
            sum: 0.0,
            count: 0,
        }
    }

    fn observe(&mut self, value: f64) {
        self.count = self.count.saturating_add(1);
        self.sum += value;
        for (bound, bucket) in self.bounds.iter().zip(self.buckets.iter_mut()) {
            if value <= *bound {
                *bucket = bucket.saturating_add(1);
            }
        }
    }

    fn snapshot(&self) -> HistogramSnapshot {
        HistogramSnapshot {
            buckets: self.bounds.iter().copied().zip(self.buckets.iter().copied()).collect(),
            sum: self.sum,
            count: self.count,
        }
    }
}

pub struct Registry {
    families: DashMap<String, Family>,
    help: DashMap<String, String>,
    series: DashMap<MetricId, InstrumentHandle>,
    slots: DashMap<u64, Slot>,
    next_slot: AtomicU64,
    default_buckets: Arc<[f64]>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Empty registry using [`DEFAULT_BUCKETS`] for histograms.
    pub fn new() -> Self {
        Self {
            families: DashMap::new(),
            help: DashMap::new(),
            series: DashMap::new(),
            slots: DashMap::new(),
            next_slot: AtomicU64::new(1),
            default_buckets: Arc::from(&DEFAULT_BUCKETS[..]),
        }
    }

    /// Empty registry with a custom default histogram layout.
    pub fn with_default_buckets(bounds: &[f64]) -> Result<Self> {
        validate_buckets(bounds)?;
        Ok(Self {
            default_buckets: Arc::from(bounds),
            ..Self::new()
        })
    }

    pub fn default_buckets(&self) -> &[f64] {
        &self.default_buckets
    }

    /// Register a series. New histogram families get the default buckets;
    /// existing ones keep the bounds they were created with.
    ///
    /// Idempotent: registering an identical identity returns the existing
    /// handle. Fails with `DuplicateMetric` when the name is already taken by
    /// another kind.
    pub fn register(&self, id: MetricId) -> Result<InstrumentHandle> {
        let bounds = match id.kind {
            MetricKind::Histogram => Some(
                self.families
                    .get(&id.name)
                    .and_then(|f| f.buckets.clone())
                    .unwrap_or_else(|| Arc::clone(&self.default_buckets)),
            ),
            _ => None,
        };
        self.register_inner(id, bounds)
    }

    /// Register a histogram series with explicit bucket bounds.
    ///
    /// All series of one histogram family must share the same bounds.
    pub fn register_histogram(&self, id: MetricId, bounds: &[f64]) -> Result<InstrumentHandle> {
        if id.kind != MetricKind::Histogram {
            return Err(VigilError::KindMismatch {
                expected: MetricKind::Histogram,
                found: id.kind,
            });
        }
        validate_buckets(bounds)?;
        self.register_inner(id, Some(Arc::from(bounds)))
    }

    fn register_inner(&self, id: MetricId, bounds: Option<Arc<[f64]>>) -> Result<InstrumentHandle> {
        id.validate()?;

        // Reserve the family first; the guard is dropped before touching the
        // series index so the two maps are never locked together.
        {
            let family = self.families.entry(id.name.clone()).or_insert_with(|| Family {
                kind: id.kind,
                buckets: bounds.clone(),
            });
            if family.kind != id.kind {
                return Err(VigilError::DuplicateMetric {
                    name: id.name.clone(),
                    detail: format!("already registered as {}, requested {}", family.kind, id.kind),
                });
            }
            if family.buckets.as_deref() != bounds.as_deref() {
                return Err(VigilError::DuplicateMetric {
                    name: id.name.clone(),
                    detail: "histogram already registered with different buckets".into(),
                });
            }
        }

        match self.series.entry(id) {
            Entry::Occupied(e) => Ok(*e.get()),
            Entry::Vacant(e) => {
                let kind = e.key().kind;
                let instrument = match (kind, bounds) {
                    (MetricKind::Counter, _) => Instrument::Counter(AtomicU64::new(0)),
                    (MetricKind::Gauge, _) => Instrument::Gauge(AtomicU64::new(0f64.to_bits())),
                    (MetricKind::Histogram, Some(b)) => {
                        Instrument::Histogram(Mutex::new(HistogramState::new(b)))
                    }
                    (MetricKind::Histogram, None) => {
                        return Err(VigilError::InvalidBuckets("histogram without buckets".into()))
                    }
                };
                let slot = self.next_slot.fetch_add(1, Ordering::Relaxed);
                let handle = InstrumentHandle { slot, kind };
                tracing::debug!(name = %e.key().name, %kind, slot, "series registered");
                self.slots.insert(slot, Slot { id: e.key().clone(), instrument });
                e.insert(handle);
                Ok(handle)
            }
        }
    }

    /// Remove a series. Any later use of `handle` fails with `UnknownHandle`.
    pub fn unregister(&self, handle: &InstrumentHandle) -> Result<()> {
        let id = self.slot(handle)?.id.clone();
        self.series.remove_if(&id, |_, h| h.slot == handle.slot);
        self.slots.remove(&handle.slot);
        Ok(())
    }

    /// Attach HELP text to a metric family.
    pub fn describe(&self, name: &str, help: &str) {
        self.help.insert(name.to_string(), help.to_string());
    }

    /// Add `delta` to a counter. Negative deltas and overflow are rejected;
    /// the stored value is left untouched on error.
    pub fn increment(&self, handle: &InstrumentHandle, delta: i64) -> Result<()> {
        let delta = u64::try_from(delta).map_err(|_| VigilError::InvalidDelta(delta))?;
        let slot = self.slot(handle)?;
        match &slot.instrument {
            Instrument::Counter(v) => v
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| cur.checked_add(delta))
                .map(|_| ())
                .map_err(|_| VigilError::CounterOverflow {
                    name: slot.id.name.clone(),
                }),
            other => Err(mismatch(MetricKind::Counter, other)),
        }
    }

    pub fn inc(&self, handle: &InstrumentHandle) -> Result<()> {
        self.increment(handle, 1)
    }

    /// Overwrite a gauge.
    pub fn set(&self, handle: &InstrumentHandle, value: f64) -> Result<()> {
        let slot = self.slot(handle)?;
        match &slot.instrument {
            Instrument::Gauge(bits) => {
                bits.store(value.to_bits(), Ordering::Relaxed);
                Ok(())
            }
            other => Err(mismatch(MetricKind::Gauge, other)),
        }
    }

    /// Add a signed delta to a gauge.
    pub fn add(&self, handle: &InstrumentHandle, delta: f64) -> Result<()> {
        let slot = self.slot(handle)?;
        match &slot.instrument {
            Instrument::Gauge(bits) => {
                // The closure always returns Some, so this cannot fail.
                let _ = bits.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| {
                    Some((f64::from_bits(cur) + delta).to_bits())
                });
                Ok(())
            }
            other => Err(mismatch(MetricKind::Gauge, other)),
        }
    }

    /// Record one histogram observation.
    pub fn observe(&self, handle: &InstrumentHandle, value: f64) -> Result<()> {
        if value.is_nan() {
            return Err(VigilError::InvalidValue("histogram observation is NaN".into()));
        }
        let slot = self.slot(handle)?;
        match &slot.instrument {
            Instrument::Histogram(state) => {
                state.lock().unwrap_or_else(PoisonError::into_inner).observe(value);
                Ok(())
            }
            other => Err(mismatch(MetricKind::Histogram, other)),
        }
    }

    /// Sum over every series of a counter family.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.slots
            .iter()
            .filter(|s| s.id.name == name)
            .filter_map(|s| match &s.instrument {
                Instrument::Counter(v) => Some(v.load(Ordering::Relaxed)),
                _ => None,
            })
            .fold(0u64, u64::saturating_add)
    }

    /// Point-in-time copy of every series, sorted for stable iteration.
    pub fn snapshot(&self) -> Snapshot {
        let mut grouped: BTreeMap<String, (MetricKind, BTreeMap<Labels, SeriesValue>)> =
            BTreeMap::new();

        for slot in self.slots.iter() {
            let value = match &slot.instrument {
                Instrument::Counter(v) => SeriesValue::Counter(v.load(Ordering::Relaxed)),
                Instrument::Gauge(bits) => {
                    SeriesValue::Gauge(f64::from_bits(bits.load(Ordering::Relaxed)))
                }
                Instrument::Histogram(state) => SeriesValue::Histogram(
                    state.lock().unwrap_or_else(PoisonError::into_inner).snapshot(),
                ),
            };
            grouped
                .entry(slot.id.name.clone())
                .or_insert_with(|| (slot.id.kind, BTreeMap::new()))
                .1
                .insert(slot.id.labels.clone(), value);
        }

        let families = grouped
            .into_iter()
            .map(|(name, (kind, series))| FamilySnapshot {
                help: self.help.get(&name).map(|h| h.value().clone()),
                name,
                kind,
                series: series
                    .into_iter()
                    .map(|(labels, value)| Series { labels, value })
                    .collect(),
            })
            .collect();

        Snapshot { families }
    }

    fn slot(&self, handle: &InstrumentHandle) -> Result<Ref<'_, u64, Slot>> {
        self.slots.get(&handle.slot).ok_or(VigilError::UnknownHandle)
    }
}

fn mismatch(expected: MetricKind, found: &Instrument) -> VigilError {
    let found = match found {
        Instrument::Counter(_) => MetricKind::Counter,
        Instrument::Gauge(_) => MetricKind::Gauge,
        Instrument::Histogram(_) => MetricKind::Histogram,
    };
    VigilError::KindMismatch { expected, found }
}
