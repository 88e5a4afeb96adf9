use clap::Parser;
use std::time::Duration;

use crate::domain::CycleErrorPolicy;

use super::parsers::{parse_duration_arg, parse_positive_u64, parse_positive_usize};
use super::types::{PositiveU64, PositiveUsize};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Concurrency-bound load generator for gRPC and WebSocket services, reporting success counts and latencies to StatsD."
)]
pub struct LoadArgs {
    /// Path to a config file (.toml or .json)
    #[arg(long = "config", short = 'c', env = "LOADGEN_CONFIG")]
    pub config: Option<String>,

    /// Target address (host:port)
    #[arg(long = "target", short = 't')]
    pub target: Option<String>,

    /// Wire protocol (grpc, websocket)
    #[arg(long = "protocol", short = 'p')]
    pub protocol: Option<String>,

    /// Number of concurrent workers, one connection each
    #[arg(long = "concurrency", short = 'n', value_parser = parse_positive_usize)]
    pub concurrency: Option<PositiveUsize>,

    /// Run duration in seconds
    #[arg(long = "duration", short = 'd', value_parser = parse_positive_u64)]
    pub duration: Option<PositiveU64>,

    /// Connect timeout per worker (supports ms/s/m/h)
    #[arg(long = "connect-timeout", value_parser = parse_duration_arg)]
    pub connect_timeout: Option<Duration>,

    /// Timeout for a single request/response cycle (supports ms/s/m/h)
    #[arg(long = "request-timeout", value_parser = parse_duration_arg)]
    pub request_timeout: Option<Duration>,

    /// Message sent on every cycle
    #[arg(long = "message", short = 'm')]
    pub message: Option<String>,

    /// Fully qualified gRPC method path
    #[arg(long = "grpc-method")]
    pub grpc_method: Option<String>,

    /// Path appended to the target for WebSocket connections
    #[arg(long = "websocket-path")]
    pub websocket_path: Option<String>,

    /// What a worker does after a failed cycle
    #[arg(long = "on-cycle-error", value_enum)]
    pub on_cycle_error: Option<CycleErrorPolicy>,

    /// StatsD collector address (host:port)
    #[arg(long = "statsd-addr", env = "LOADGEN_STATSD_ADDR")]
    pub statsd_addr: Option<String>,

    /// Prefix for every StatsD bucket
    #[arg(long = "statsd-prefix")]
    pub statsd_prefix: Option<String>,

    /// Disable StatsD emission
    #[arg(long = "no-statsd")]
    pub no_statsd: bool,

    /// Enable debug logging
    #[arg(long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Skip the summary printed after the run
    #[arg(long = "no-summary")]
    pub no_summary: bool,
}
