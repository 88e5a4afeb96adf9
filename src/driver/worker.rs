use std::sync::Arc;

use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, warn};

use crate::domain::CycleErrorPolicy;
use crate::metrics::MetricsSink;
use crate::protocol::{Connection, ProtocolAdapter};
use crate::shutdown::ShutdownReceiver;

use super::deadline::Deadline;

/// Why a worker reached `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    ConnectFailed,
    DeadlineReached,
    ShutdownRequested,
    CycleFailed,
    /// The worker task panicked or was cancelled before reporting.
    Aborted,
}

impl WorkerExit {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            WorkerExit::ConnectFailed => "connect failed",
            WorkerExit::DeadlineReached => "deadline reached",
            WorkerExit::ShutdownRequested => "shutdown requested",
            WorkerExit::CycleFailed => "cycle failed",
            WorkerExit::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub id: usize,
    /// Cycles executed, failed ones included.
    pub cycles: u64,
    pub failures: u64,
    pub exit: WorkerExit,
}

enum WorkerState {
    Connecting,
    Running(Box<dyn Connection>),
    Terminating(Box<dyn Connection>, WorkerExit),
    Closed(WorkerExit),
}

pub(super) struct Worker {
    pub(super) id: usize,
    pub(super) target: Arc<str>,
    pub(super) adapter: Arc<dyn ProtocolAdapter>,
    pub(super) sink: Arc<dyn MetricsSink>,
    pub(super) deadline: Deadline,
    pub(super) shutdown_rx: ShutdownReceiver,
    pub(super) policy: CycleErrorPolicy,
}

impl Worker {
    pub(super) async fn run(mut self) -> WorkerReport {
        let names = self.adapter.metric_names();
        let mut cycles: u64 = 0;
        let mut failures: u64 = 0;
        let mut state = WorkerState::Connecting;

        loop {
            state = match state {
                WorkerState::Connecting => match self.adapter.connect(&self.target).await {
                    Ok(connection) => {
                        debug!("Worker {} connected to {}", self.id, self.target);
                        WorkerState::Running(connection)
                    }
                    Err(err) => {
                        warn!("Worker {} failed to connect: {}", self.id, err);
                        WorkerState::Closed(WorkerExit::ConnectFailed)
                    }
                },
                WorkerState::Running(mut connection) => {
                    if let Some(exit) = self.stop_requested() {
                        WorkerState::Terminating(connection, exit)
                    } else {
                        let outcome = connection.execute_once().await;
                        cycles = cycles.saturating_add(1);
                        match outcome.error {
                            None => {
                                self.sink.increment(names.success, 1);
                                self.sink.observe_latency(names.latency, outcome.latency);
                                WorkerState::Running(connection)
                            }
                            Some(err) => {
                                failures = failures.saturating_add(1);
                                warn!("Worker {} cycle failed: {}", self.id, err);
                                if self.policy.stops_on(&err) {
                                    WorkerState::Terminating(connection, WorkerExit::CycleFailed)
                                } else {
                                    WorkerState::Running(connection)
                                }
                            }
                        }
                    }
                }
                WorkerState::Terminating(mut connection, exit) => {
                    connection.close().await;
                    WorkerState::Closed(exit)
                }
                WorkerState::Closed(exit) => {
                    debug!(
                        "Worker {} closed after {} cycles: {}",
                        self.id,
                        cycles,
                        exit.as_str()
                    );
                    return WorkerReport {
                        id: self.id,
                        cycles,
                        failures,
                        exit,
                    };
                }
            };
        }
    }

    /// Non-blocking check of the deadline and the shutdown signal.
    fn stop_requested(&mut self) -> Option<WorkerExit> {
        match self.shutdown_rx.try_recv() {
            Ok(()) | Err(TryRecvError::Closed | TryRecvError::Lagged(_)) => {
                return Some(WorkerExit::ShutdownRequested);
            }
            Err(TryRecvError::Empty) => {}
        }
        if self.deadline.has_elapsed() {
            return Some(WorkerExit::DeadlineReached);
        }
        None
    }
}
