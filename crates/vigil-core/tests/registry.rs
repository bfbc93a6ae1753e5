//! Registry semantics: counters, gauges, histograms and handle lifecycle.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use vigil_core::{MetricId, MetricKind, Registry, SeriesValue, VigilError};

fn value_of(reg: &Registry, id: &MetricId) -> SeriesValue {
    let snap = reg.snapshot();
    snap.family(&id.name)
        .and_then(|f| f.get(&id.labels))
        .cloned()
        .expect("series present")
}

#[test]
fn counter_equals_sum_of_deltas() {
    let reg = Registry::new();
    let id = MetricId::counter("jobs_total").with_label("queue", "default");
    let h = reg.register(id.clone()).unwrap();

    let deltas = [0i64, 1, 7, 42, 3, 1_000];
    for d in deltas {
        reg.increment(&h, d).unwrap();
    }
    assert_eq!(value_of(&reg, &id), SeriesValue::Counter(deltas.iter().sum::<i64>() as u64));
}

#[test]
fn negative_delta_is_rejected_and_value_kept() {
    let reg = Registry::new();
    let id = MetricId::counter("jobs_total");
    let h = reg.register(id.clone()).unwrap();
    reg.increment(&h, 5).unwrap();

    let err = reg.increment(&h, -1).unwrap_err();
    assert!(matches!(err, VigilError::InvalidDelta(-1)));
    assert!(err.is_registry_error());
    assert_eq!(value_of(&reg, &id), SeriesValue::Counter(5));
}

#[test]
fn overflow_is_detected_before_wrap() {
    let reg = Registry::new();
    let id = MetricId::counter("big_total");
    let h = reg.register(id.clone()).unwrap();
    for _ in 0..2 {
        reg.increment(&h, i64::MAX).unwrap();
    }
    // 2 * i64::MAX == u64::MAX - 1
    reg.increment(&h, 1).unwrap();
    let err = reg.increment(&h, 1).unwrap_err();
    assert!(matches!(err, VigilError::CounterOverflow { ref name } if name == "big_total"));
    assert_eq!(value_of(&reg, &id), SeriesValue::Counter(u64::MAX));
}

#[test]
fn register_is_idempotent_for_identical_identity() {
    let reg = Registry::new();
    let a = reg
        .register(MetricId::counter("req_total").with_label("a", "1").with_label("b", "2"))
        .unwrap();
    // Same labels, different insertion order.
    let b = reg
        .register(MetricId::counter("req_total").with_label("b", "2").with_label("a", "1"))
        .unwrap();
    assert_eq!(a, b);

    let other = reg.register(MetricId::counter("req_total").with_label("a", "9")).unwrap();
    assert_ne!(a, other);
}

#[test]
fn same_name_different_kind_is_duplicate() {
    let reg = Registry::new();
    reg.register(MetricId::counter("thing")).unwrap();
    let err = reg.register(MetricId::gauge("thing")).unwrap_err();
    assert!(matches!(err, VigilError::DuplicateMetric { .. }));

    // Other label sets under the same name still must match the kind.
    let err = reg.register(MetricId::histogram("thing").with_label("x", "y")).unwrap_err();
    assert!(matches!(err, VigilError::DuplicateMetric { .. }));
}

#[test]
fn histogram_bucket_layout_is_fixed_per_family() {
    let reg = Registry::new();
    reg.register_histogram(MetricId::histogram("lat_seconds").with_label("r", "/a"), &[0.1, 1.0])
        .unwrap();
    reg.register_histogram(MetricId::histogram("lat_seconds").with_label("r", "/b"), &[0.1, 1.0])
        .unwrap();
    let err = reg
        .register_histogram(MetricId::histogram("lat_seconds").with_label("r", "/c"), &[0.5])
        .unwrap_err();
    assert!(matches!(err, VigilError::DuplicateMetric { .. }));

    let err = reg.register_histogram(MetricId::histogram("bad_seconds"), &[1.0, 0.5]).unwrap_err();
    assert!(matches!(err, VigilError::InvalidBuckets(_)));
}

#[test]
fn plain_register_reuses_existing_histogram_layout() {
    let reg = Registry::new();
    let id = MetricId::histogram("custom_seconds").with_label("r", "/a");
    let first = reg.register_histogram(id.clone(), &[0.5, 5.0]).unwrap();

    // Same identity through the default-bucket path is the same series.
    let again = reg.register(id.clone()).unwrap();
    assert_eq!(first, again);

    // A sibling series inherits the family's bounds.
    let sibling = MetricId::histogram("custom_seconds").with_label("r", "/b");
    let h = reg.register(sibling.clone()).unwrap();
    reg.observe(&h, 1.0).unwrap();
    let SeriesValue::Histogram(snap) = value_of(&reg, &sibling) else {
        panic!("expected histogram");
    };
    assert_eq!(snap.buckets, vec![(0.5, 0), (5.0, 1)]);
}

#[test]
fn invalid_names_are_rejected() {
    let reg = Registry::new();
    let err = reg.register(MetricId::counter("9lives")).unwrap_err();
    assert!(matches!(err, VigilError::InvalidName(_)));
    let err = reg.register(MetricId::counter("ok_total").with_label("bad-key", "v")).unwrap_err();
    assert!(matches!(err, VigilError::InvalidName(_)));
}

#[test]
fn histogram_count_sum_and_cumulative_buckets() {
    let reg = Registry::new();
    let id = MetricId::histogram("op_seconds");
    let h = reg.register_histogram(id.clone(), &[0.1, 0.5, 1.0, 2.0]).unwrap();

    let values = [0.05, 0.1, 0.3, 0.7, 0.7, 1.5, 4.0, 0.0];
    for v in values {
        reg.observe(&h, v).unwrap();
    }

    let SeriesValue::Histogram(snap) = value_of(&reg, &id) else {
        panic!("expected histogram");
    };
    assert_eq!(snap.count, values.len() as u64);
    assert!((snap.sum - values.iter().sum::<f64>()).abs() < 1e-9);

    let counts: Vec<u64> = snap.buckets.iter().map(|(_, c)| *c).collect();
    assert_eq!(counts, vec![3, 4, 6, 7]);
    assert!(counts.windows(2).all(|w| w[0] <= w[1]));
    assert!(*counts.last().unwrap() <= snap.count);
}

#[test]
fn nan_observation_is_rejected() {
    let reg = Registry::new();
    let h = reg.register(MetricId::histogram("op_seconds")).unwrap();
    assert!(matches!(reg.observe(&h, f64::NAN), Err(VigilError::InvalidValue(_))));
}

#[test]
fn default_buckets_apply_to_plain_register() {
    let reg = Registry::with_default_buckets(&[1.0, 2.0]).unwrap();
    let id = MetricId::histogram("d_seconds");
    let h = reg.register(id.clone()).unwrap();
    reg.observe(&h, 1.5).unwrap();
    let SeriesValue::Histogram(snap) = value_of(&reg, &id) else {
        panic!("expected histogram");
    };
    assert_eq!(snap.buckets, vec![(1.0, 0), (2.0, 1)]);

    assert!(Registry::with_default_buckets(&[]).is_err());
}

#[test]
fn gauge_set_and_add() {
    let reg = Registry::new();
    let id = MetricId::gauge("temperature");
    let h = reg.register(id.clone()).unwrap();

    reg.set(&h, 21.5).unwrap();
    reg.add(&h, -1.5).unwrap();
    assert_eq!(value_of(&reg, &id), SeriesValue::Gauge(20.0));

    reg.set(&h, -3.0).unwrap();
    assert_eq!(value_of(&reg, &id), SeriesValue::Gauge(-3.0));
}

#[test]
fn wrong_kind_operations_fail() {
    let reg = Registry::new();
    let c = reg.register(MetricId::counter("c_total")).unwrap();
    let g = reg.register(MetricId::gauge("g")).unwrap();

    assert!(matches!(
        reg.observe(&c, 1.0),
        Err(VigilError::KindMismatch {
            expected: MetricKind::Histogram,
            found: MetricKind::Counter,
        })
    ));
    assert!(matches!(reg.increment(&g, 1), Err(VigilError::KindMismatch { .. })));
    assert!(matches!(reg.set(&c, 1.0), Err(VigilError::KindMismatch { .. })));
}

#[test]
fn stale_handle_after_unregister() {
    let reg = Registry::new();
    let id = MetricId::histogram("gone_seconds");
    let h = reg.register(id.clone()).unwrap();
    reg.observe(&h, 0.2).unwrap();

    reg.unregister(&h).unwrap();
    assert!(matches!(reg.observe(&h, 0.2), Err(VigilError::UnknownHandle)));
    assert!(matches!(reg.unregister(&h), Err(VigilError::UnknownHandle)));
    assert!(reg.snapshot().family("gone_seconds").is_none());

    // Re-registering yields a fresh series starting from zero.
    let h2 = reg.register(id.clone()).unwrap();
    assert_ne!(h, h2);
    let SeriesValue::Histogram(snap) = value_of(&reg, &id) else {
        panic!("expected histogram");
    };
    assert_eq!(snap.count, 0);

    // The name keeps its kind.
    assert!(reg.register(MetricId::counter("gone_seconds")).is_err());
}

#[test]
fn counter_total_sums_all_label_sets() {
    let reg = Registry::new();
    for (route, n) in [("/a", 2), ("/b", 3), ("/c", 0)] {
        let h = reg.register(MetricId::counter("hits_total").with_label("route", route)).unwrap();
        reg.increment(&h, n).unwrap();
    }
    assert_eq!(reg.counter_total("hits_total"), 5);
    assert_eq!(reg.snapshot().counter_total("hits_total"), 5);
    assert_eq!(reg.counter_total("missing_total"), 0);
}

#[test]
fn concurrent_increments_do_not_lose_updates() {
    const CALLERS: usize = 128;
    const PER_CALLER: u64 = 1_000;

    let reg = Arc::new(Registry::new());
    let id = MetricId::counter("concurrent_total");
    let hist = MetricId::histogram("concurrent_seconds");

    std::thread::scope(|s| {
        for i in 0..CALLERS {
            let reg = Arc::clone(&reg);
            let id = id.clone();
            let hist = hist.clone();
            s.spawn(move || {
                // Every caller registers for itself to exercise idempotent registration.
                let c = reg.register(id).unwrap();
                let h = reg.register(hist).unwrap();
                for _ in 0..PER_CALLER {
                    reg.inc(&c).unwrap();
                    reg.observe(&h, (i % 3) as f64 * 0.01).unwrap();
                }
            });
        }
    });

    let expected = CALLERS as u64 * PER_CALLER;
    assert_eq!(value_of(&reg, &id), SeriesValue::Counter(expected));
    let SeriesValue::Histogram(snap) = value_of(&reg, &hist) else {
        panic!("expected histogram");
    };
    assert_eq!(snap.count, expected);
}
