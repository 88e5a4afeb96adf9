use std::time::Duration;

use crate::args::LoadArgs;
use crate::domain::{AdapterSettings, RunConfig};
use crate::error::{AppError, AppResult, ConfigError};
use crate::metrics::{DEFAULT_STATSD_ADDR, DEFAULT_STATSD_PREFIX};

use super::types::{ConfigFile, DurationValue, MetricsConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsdSettings {
    pub addr: String,
    pub prefix: String,
}

/// Everything the entry point needs once CLI flags and the config file
/// have been merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub run: RunConfig,
    /// `None` when StatsD emission is disabled.
    pub statsd: Option<StatsdSettings>,
    pub summary: bool,
}

/// Merges CLI arguments over config file values. CLI values win.
///
/// # Errors
///
/// Returns an error when a required field is missing from both sources or a
/// config value is out of range.
pub fn apply_config(args: &LoadArgs, config: Option<&ConfigFile>) -> AppResult<RunPlan> {
    let empty = ConfigFile::default();
    let config = config.unwrap_or(&empty);

    let target = args
        .target
        .clone()
        .or_else(|| config.target.clone())
        .ok_or(ConfigError::MissingField { field: "target" })?;
    let protocol = args
        .protocol
        .clone()
        .or_else(|| config.protocol.clone())
        .ok_or(ConfigError::MissingField { field: "protocol" })?;

    let concurrency = match (args.concurrency, config.concurrency) {
        (Some(value), _) => value.get(),
        (None, Some(0)) => {
            return Err(AppError::config(ConfigError::FieldMustBePositive {
                field: "concurrency",
            }));
        }
        (None, Some(value)) => value,
        (None, None) => {
            return Err(AppError::config(ConfigError::MissingField {
                field: "concurrency",
            }));
        }
    };

    let duration_secs = match (args.duration, config.duration.as_ref()) {
        (Some(value), _) => value.get(),
        (None, Some(value)) => whole_seconds(value)?,
        (None, None) => {
            return Err(AppError::config(ConfigError::MissingField {
                field: "duration",
            }));
        }
    };

    let mut adapter = AdapterSettings::default();
    if let Some(timeout) = pick_duration(args.connect_timeout, config.connect_timeout.as_ref())? {
        adapter.connect_timeout = timeout;
    }
    adapter.request_timeout =
        pick_duration(args.request_timeout, config.request_timeout.as_ref())?;
    if let Some(message) = args.message.clone().or_else(|| config.message.clone()) {
        adapter.message = message;
    }
    if let Some(method) = args.grpc_method.clone().or_else(|| config.grpc_method.clone()) {
        adapter.grpc_method = method;
    }
    if let Some(path) = args
        .websocket_path
        .clone()
        .or_else(|| config.websocket_path.clone())
    {
        adapter.websocket_path = path;
    }

    let mut run = RunConfig::new(target, protocol, concurrency, duration_secs);
    run.adapter = adapter;
    if let Some(policy) = args.on_cycle_error.or(config.on_cycle_error) {
        run.on_cycle_error = policy;
    }
    run.validate().map_err(AppError::config)?;

    Ok(RunPlan {
        run,
        statsd: statsd_settings(args, config.metrics.as_ref()),
        summary: !args.no_summary,
    })
}

fn whole_seconds(value: &DurationValue) -> AppResult<u64> {
    let duration = value.to_duration().map_err(AppError::config)?;
    if duration.subsec_nanos() != 0 {
        return Err(AppError::config(ConfigError::InvalidDurationFormat {
            value: format!("{:?} (run duration must be whole seconds)", duration),
        }));
    }
    Ok(duration.as_secs())
}

fn pick_duration(
    cli: Option<Duration>,
    file: Option<&DurationValue>,
) -> AppResult<Option<Duration>> {
    if cli.is_some() {
        return Ok(cli);
    }
    file.map(DurationValue::to_duration)
        .transpose()
        .map_err(AppError::config)
}

fn statsd_settings(args: &LoadArgs, metrics: Option<&MetricsConfig>) -> Option<StatsdSettings> {
    let enabled = metrics.and_then(|metrics| metrics.enabled).unwrap_or(true);
    if args.no_statsd || !enabled {
        return None;
    }
    let addr = args
        .statsd_addr
        .clone()
        .or_else(|| metrics.and_then(|metrics| metrics.statsd_addr.clone()))
        .unwrap_or_else(|| DEFAULT_STATSD_ADDR.to_owned());
    let prefix = args
        .statsd_prefix
        .clone()
        .or_else(|| metrics.and_then(|metrics| metrics.prefix.clone()))
        .unwrap_or_else(|| DEFAULT_STATSD_PREFIX.to_owned());
    Some(StatsdSettings { addr, prefix })
}
