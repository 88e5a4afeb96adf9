use std::sync::Arc;
use std::time::Duration;

/// A single emission handed to a [`MetricsSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricEvent<'name> {
    Increment { name: &'name str, delta: i64 },
    Latency { name: &'name str, value: Duration },
}

impl MetricEvent<'_> {
    #[must_use]
    pub const fn name(&self) -> &str {
        match self {
            MetricEvent::Increment { name, .. } | MetricEvent::Latency { name, .. } => *name,
        }
    }
}

/// Destination for worker metrics.
///
/// Implementations are shared by every worker of a run and are called from
/// many tasks at once. They must not block and must never surface a failure
/// to the caller: a sink that cannot deliver an event drops it.
pub trait MetricsSink: Send + Sync {
    fn record(&self, event: MetricEvent<'_>);

    fn increment(&self, name: &str, delta: i64) {
        self.record(MetricEvent::Increment { name, delta });
    }

    fn observe_latency(&self, name: &str, value: Duration) {
        self.record(MetricEvent::Latency { name, value });
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn record(&self, _event: MetricEvent<'_>) {}
}

/// Forwards every event to each inner sink in order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn MetricsSink>>,
}

impl FanoutSink {
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn MetricsSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn MetricsSink>) {
        self.sinks.push(sink);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl MetricsSink for FanoutSink {
    fn record(&self, event: MetricEvent<'_>) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}
