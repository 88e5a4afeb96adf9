use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::histogram::LatencyHistogram;
use super::sink::{MetricEvent, MetricsSink};

/// Events buffered between workers and the recorder task before new ones
/// are dropped.
pub const DEFAULT_RECORDER_CAPACITY: usize = 65_536;

enum RecorderMessage {
    Increment { name: String, delta: i64 },
    Latency { name: String, value: Duration },
    Snapshot(oneshot::Sender<RecorderSnapshot>),
}

#[derive(Debug, Default)]
struct RecorderState {
    counters: BTreeMap<String, i64>,
    latencies: BTreeMap<String, LatencyHistogram>,
}

impl RecorderState {
    fn increment(&mut self, name: String, delta: i64) {
        let counter = self.counters.entry(name).or_insert(0);
        *counter = counter.saturating_add(delta);
    }

    fn observe(&mut self, name: String, value: Duration) {
        if let Some(hist) = self.latencies.get_mut(&name) {
            if let Err(err) = hist.record(value) {
                debug!("Dropped latency sample for '{}': {}", name, err);
            }
            return;
        }
        match LatencyHistogram::new() {
            Ok(mut hist) => {
                if let Err(err) = hist.record(value) {
                    debug!("Dropped latency sample for '{}': {}", name, err);
                }
                self.latencies.insert(name, hist);
            }
            Err(err) => debug!("Dropped latency sample for '{}': {}", name, err),
        }
    }

    fn snapshot(&self) -> RecorderSnapshot {
        let counters = self
            .counters
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect();
        let latencies = self
            .latencies
            .iter()
            .map(|(name, hist)| {
                let (p50, p90, p99) = hist.percentiles();
                LatencySummary {
                    name: name.clone(),
                    count: hist.count(),
                    min: Duration::from_micros(hist.min_micros()),
                    max: Duration::from_micros(hist.max_micros()),
                    p50: Duration::from_micros(p50),
                    p90: Duration::from_micros(p90),
                    p99: Duration::from_micros(p99),
                }
            })
            .collect();
        RecorderSnapshot {
            counters,
            latencies,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencySummary {
    pub name: String,
    pub count: u64,
    pub min: Duration,
    pub max: Duration,
    pub p50: Duration,
    pub p90: Duration,
    pub p99: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecorderSnapshot {
    pub counters: Vec<(String, i64)>,
    pub latencies: Vec<LatencySummary>,
}

impl RecorderSnapshot {
    #[must_use]
    pub fn counter(&self, name: &str) -> i64 {
        self.counters
            .iter()
            .find(|(counter, _)| counter == name)
            .map_or(0, |(_, value)| *value)
    }

    #[must_use]
    pub fn latency(&self, name: &str) -> Option<&LatencySummary> {
        self.latencies.iter().find(|summary| summary.name == name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.latencies.is_empty()
    }
}

/// Aggregates events in process so the entry point can print a summary once
/// the run has finished.
///
/// Workers only enqueue onto a bounded channel; a collector task owns the
/// counters and histograms. A full queue drops the event.
#[derive(Debug)]
pub struct RunRecorder {
    tx: mpsc::Sender<RecorderMessage>,
    dropped: AtomicU64,
}

impl RunRecorder {
    /// Starts the collector task on the current tokio runtime.
    #[must_use]
    pub fn spawn(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::spawn(collect(rx));
        Self {
            tx,
            dropped: AtomicU64::new(0),
        }
    }

    /// Aggregated view of every event enqueued before this call.
    pub async fn snapshot(&self) -> RecorderSnapshot {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .tx
            .send(RecorderMessage::Snapshot(reply_tx))
            .await
            .is_err()
        {
            warn!("Metrics recorder stopped before the summary was read");
            return RecorderSnapshot::default();
        }
        reply_rx.await.unwrap_or_default()
    }

    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl MetricsSink for RunRecorder {
    fn record(&self, event: MetricEvent<'_>) {
        let message = match event {
            MetricEvent::Increment { name, delta } => RecorderMessage::Increment {
                name: name.to_owned(),
                delta,
            },
            MetricEvent::Latency { name, value } => RecorderMessage::Latency {
                name: name.to_owned(),
                value,
            },
        };
        if let Err(err) = self.tx.try_send(message) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            debug!("Dropped recorder event: {}", err);
        }
    }
}

async fn collect(mut rx: mpsc::Receiver<RecorderMessage>) {
    let mut state = RecorderState::default();
    while let Some(message) = rx.recv().await {
        match message {
            RecorderMessage::Increment { name, delta } => state.increment(name, delta),
            RecorderMessage::Latency { name, value } => state.observe(name, value),
            RecorderMessage::Snapshot(reply) => drop(reply.send(state.snapshot())),
        }
    }
}
