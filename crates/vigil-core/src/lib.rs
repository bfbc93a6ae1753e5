//! vigil core: transport-agnostic metric primitives, error types and the
//! exposition encoder.
//!
//! This crate owns the in-process metric [`Registry`], its point-in-time
//! [`Snapshot`] and the Prometheus text encoder. It carries no HTTP or runtime
//! dependencies so the registry can be embedded in any process.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Instrumentation runs on every request path, so every fallible operation
//! surfaces as `VigilError`/`Result` and never brings the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod exposition;
pub mod metric;
pub mod registry;
pub mod snapshot;

/// Shared result type.
pub use error::{Result, VigilError};
pub use metric::{Labels, MetricId, MetricKind, DEFAULT_BUCKETS};
pub use registry::{InstrumentHandle, Registry};
pub use snapshot::{FamilySnapshot, HistogramSnapshot, Series, SeriesValue, Snapshot};
