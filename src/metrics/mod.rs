//! Metrics sinks: the fire-and-forget interface workers report through, a
//! StatsD transport, and an in-process recorder for the run summary.
mod histogram;
mod recorder;
mod sink;
mod statsd;


pub use histogram::LatencyHistogram;
pub use recorder::{DEFAULT_RECORDER_CAPACITY, LatencySummary, RecorderSnapshot, RunRecorder};
pub use sink::{FanoutSink, MetricEvent, MetricsSink, NoopSink};
pub use statsd::{DEFAULT_STATSD_ADDR, DEFAULT_STATSD_PREFIX, StatsdSink, format_statsd_line};
