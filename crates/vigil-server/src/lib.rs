//! vigil server library entry.
//!
//! Wires the core metric registry into an axum service: configuration,
//! shared state, request instrumentation, operational endpoints and the
//! simulated workloads. Consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod config;
pub mod error;
pub mod middleware;
pub mod obs;
pub mod ops;
pub mod router;
pub mod simulate;
