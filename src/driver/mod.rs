//! Runs a load test: resolves the protocol adapter, starts one worker task
//! per concurrency slot and waits for all of them to close.
mod deadline;
mod worker;


use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info};

use crate::domain::RunConfig;
use crate::error::{AppError, AppResult, ConfigError};
use crate::metrics::MetricsSink;
use crate::protocol::ProtocolRegistry;
use crate::shutdown::ShutdownSender;
use crate::shutdown_handlers::shutdown_channel;

pub use deadline::Deadline;
pub use worker::{WorkerExit, WorkerReport};

use worker::Worker;

/// Completion record of a run. Success and latency figures live in the
/// metrics sink, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub elapsed: Duration,
    pub workers: Vec<WorkerReport>,
}

impl RunReport {
    #[must_use]
    pub fn count_exits(&self, exit: WorkerExit) -> usize {
        self.workers
            .iter()
            .filter(|report| report.exit == exit)
            .count()
    }

    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.workers
            .iter()
            .fold(0, |total, report| total.saturating_add(report.cycles))
    }

    #[must_use]
    pub fn total_failures(&self) -> u64 {
        self.workers
            .iter()
            .fold(0, |total, report| total.saturating_add(report.failures))
    }
}

pub struct LoadDriver {
    registry: ProtocolRegistry,
    sink: Arc<dyn MetricsSink>,
}

impl LoadDriver {
    #[must_use]
    pub const fn new(registry: ProtocolRegistry, sink: Arc<dyn MetricsSink>) -> Self {
        Self { registry, sink }
    }

    /// Runs without an external shutdown source.
    ///
    /// # Errors
    ///
    /// See [`LoadDriver::run_with_shutdown`].
    pub async fn run(&self, config: &RunConfig) -> AppResult<RunReport> {
        let (shutdown_tx, _shutdown_rx) = shutdown_channel();
        self.run_with_shutdown(config, &shutdown_tx).await
    }

    /// Starts `config.concurrency` workers against `config.target` and
    /// returns once every worker has closed and the deadline has passed.
    /// A shutdown broadcast on `shutdown_tx` stops workers between cycles
    /// and ends the wait for the deadline.
    ///
    /// # Errors
    ///
    /// Returns an error before any worker starts when the config is invalid
    /// or the protocol is not registered.
    pub async fn run_with_shutdown(
        &self,
        config: &RunConfig,
        shutdown_tx: &ShutdownSender,
    ) -> AppResult<RunReport> {
        config.validate().map_err(AppError::config)?;
        let adapter = self
            .registry
            .resolve(&config.protocol, &config.adapter)
            .map_err(AppError::validation)?;

        let started = Instant::now();
        let deadline = Deadline::after(started, config.duration()).ok_or_else(|| {
            AppError::config(ConfigError::DeadlineOverflow {
                secs: config.duration_secs,
            })
        })?;
        info!(
            "Running {} workers against {} ({}) for {}s",
            config.concurrency,
            config.target,
            adapter.display_name(),
            config.duration_secs
        );

        // Subscribed before any worker starts so an early shutdown is not missed.
        let mut shutdown_rx = shutdown_tx.subscribe();
        let target: Arc<str> = Arc::from(config.target.as_str());
        let mut handles = Vec::with_capacity(config.concurrency);
        for id in 0..config.concurrency {
            let worker = Worker {
                id,
                target: Arc::clone(&target),
                adapter: Arc::clone(&adapter),
                sink: Arc::clone(&self.sink),
                deadline,
                shutdown_rx: shutdown_tx.subscribe(),
                policy: config.on_cycle_error,
            };
            handles.push((id, tokio::spawn(worker.run())));
        }

        let mut workers = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            match handle.await {
                Ok(report) => workers.push(report),
                Err(err) => {
                    error!("Worker {} did not finish cleanly: {}", id, err);
                    workers.push(WorkerReport {
                        id,
                        cycles: 0,
                        failures: 0,
                        exit: WorkerExit::Aborted,
                    });
                }
            }
        }

        // Workers that failed early leave the run short; hold until the
        // deadline unless shutdown was requested.
        if !deadline.has_elapsed() {
            tokio::select! {
                () = tokio::time::sleep_until(deadline.instant()) => {}
                _ = shutdown_rx.recv() => {}
            }
        }

        Ok(RunReport {
            elapsed: started.elapsed(),
            workers,
        })
    }
}
