//! Metrics recording on a `prometheus` registry.

mod recorder;

pub use recorder::{HistogramSnapshot, MetricKind, MetricsRecorder};
