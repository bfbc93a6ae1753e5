//! In-process instrumentation built on the core registry.
//!
//! `http` records per-request outcome and latency; `process` exposes start
//! time and uptime gauges refreshed on every scrape.

pub mod http;
pub mod process;

pub use http::HttpMetrics;
pub use process::ProcessMetrics;
