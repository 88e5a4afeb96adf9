use std::sync::Arc;

use tracing::{debug, warn};

use crate::args::LoadArgs;
use crate::config::{RunPlan, StatsdSettings, apply_config, load_config};
use crate::driver::LoadDriver;
use crate::error::AppResult;
use crate::metrics::{
    DEFAULT_RECORDER_CAPACITY, FanoutSink, MetricsSink, RunRecorder, StatsdSink,
};
use crate::protocol::ProtocolRegistry;
use crate::shutdown_handlers::{setup_signal_shutdown_handler, shutdown_channel};

use super::summary::format_summary;

pub(super) fn build_plan(args: &LoadArgs) -> AppResult<RunPlan> {
    let config = load_config(args.config.as_deref())?;
    apply_config(args, config.as_ref())
}

/// Metrics go to the in-process recorder and, when configured, to StatsD.
/// A collector that cannot be set up only costs the StatsD stream.
pub(super) fn build_sink(
    statsd: Option<&StatsdSettings>,
    recorder: &Arc<RunRecorder>,
) -> (Arc<dyn MetricsSink>, Option<Arc<StatsdSink>>) {
    let mut sink = FanoutSink::new(vec![Arc::clone(recorder) as Arc<dyn MetricsSink>]);
    let mut transport = None;
    if let Some(settings) = statsd {
        match StatsdSink::connect(&settings.addr, &settings.prefix) {
            Ok(statsd) => {
                let statsd = Arc::new(statsd);
                sink.push(Arc::clone(&statsd) as Arc<dyn MetricsSink>);
                transport = Some(statsd);
            }
            Err(err) => warn!("StatsD disabled for this run: {}", err),
        }
    }
    (Arc::new(sink), transport)
}

pub(super) async fn execute_plan(plan: &RunPlan) -> AppResult<()> {
    let recorder = Arc::new(RunRecorder::spawn(DEFAULT_RECORDER_CAPACITY));
    let (sink, statsd) = build_sink(plan.statsd.as_ref(), &recorder);
    let driver = LoadDriver::new(ProtocolRegistry::with_builtins(), sink);

    println!(
        "Starting load test: {} ({})",
        plan.run.target, plan.run.protocol
    );

    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);
    let result = driver.run_with_shutdown(&plan.run, &shutdown_tx).await;
    drop(shutdown_tx.send(()));
    if let Err(err) = signal_handle.await {
        warn!("Signal handler did not stop cleanly: {}", err);
    }
    let report = result?;
    if let Some(statsd) = statsd {
        debug!(
            "StatsD events sent: {}, dropped: {}",
            statsd.sent(),
            statsd.dropped()
        );
    }

    if plan.summary {
        let snapshot = recorder.snapshot().await;
        if recorder.dropped() > 0 {
            warn!(
                "{} metric events were dropped from the summary",
                recorder.dropped()
            );
        }
        for line in format_summary(&plan.run, &report, &snapshot) {
            println!("{}", line);
        }
    }
    println!("Load test finished!");
    Ok(())
}
