use std::time::Duration;

use crate::domain::RunConfig;
use crate::driver::{RunReport, WorkerExit};
use crate::metrics::RecorderSnapshot;

/// Renders the post-run summary, one line per entry.
#[must_use]
pub fn format_summary(
    config: &RunConfig,
    report: &RunReport,
    snapshot: &RecorderSnapshot,
) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "Target: {} ({}), {} workers, {}s",
        config.target, config.protocol, config.concurrency, config.duration_secs
    ));
    lines.push(format!("Elapsed: {}", format_secs(report.elapsed)));
    lines.push(format!(
        "Workers: {} reached deadline, {} connect failed, {} cycle failed, {} stopped by shutdown, {} aborted",
        report.count_exits(WorkerExit::DeadlineReached),
        report.count_exits(WorkerExit::ConnectFailed),
        report.count_exits(WorkerExit::CycleFailed),
        report.count_exits(WorkerExit::ShutdownRequested),
        report.count_exits(WorkerExit::Aborted),
    ));
    lines.push(format!(
        "Cycles: {} ({} failed)",
        report.total_cycles(),
        report.total_failures()
    ));

    if snapshot.is_empty() {
        lines.push("Metrics: none recorded".to_owned());
        return lines;
    }
    for (name, value) in &snapshot.counters {
        lines.push(format!("{}: {}", name, value));
    }
    for summary in &snapshot.latencies {
        lines.push(format!(
            "{}: count={} min={} p50={} p90={} p99={} max={}",
            summary.name,
            summary.count,
            format_millis(summary.min),
            format_millis(summary.p50),
            format_millis(summary.p90),
            format_millis(summary.p99),
            format_millis(summary.max),
        ));
    }
    lines
}

fn format_secs(value: Duration) -> String {
    format!("{}.{:03}s", value.as_secs(), value.subsec_millis())
}

fn format_millis(value: Duration) -> String {
    format!("{}.{:03}ms", value.as_millis(), value.subsec_micros() % 1_000)
}
