//! Split-series backend.
//!
//! Every reading field is pushed as its own named series to a
//! VictoriaMetrics server, labeled with sensor and gateway identity, and
//! read back with one range query per field. The per-field results are then
//! merged into per-timestamp data points.

pub mod exposition;
pub mod fields;
pub mod merge;
pub mod query_response;
pub mod victoriametrics;

pub use victoriametrics::VictoriaMetricsStorage;
