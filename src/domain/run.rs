use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, CycleError};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MESSAGE: &str = "Hello";
pub const DEFAULT_GRPC_METHOD: &str = "/test.TestService/Ping";
pub const DEFAULT_WEBSOCKET_PATH: &str = "/ws";

/// What a worker does after a failed cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CycleErrorPolicy {
    /// Any failed cycle ends the worker and closes its connection.
    #[default]
    Stop,
    /// Keep going after failures that leave the connection usable.
    ContinueOnProtocolError,
}

impl CycleErrorPolicy {
    #[must_use]
    pub const fn stops_on(self, error: &CycleError) -> bool {
        match self {
            CycleErrorPolicy::Stop => true,
            CycleErrorPolicy::ContinueOnProtocolError => !error.connection_usable(),
        }
    }
}

/// Per-protocol knobs handed to adapter constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Option<Duration>,
    pub message: String,
    pub grpc_method: String,
    pub websocket_path: String,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: None,
            message: DEFAULT_MESSAGE.to_owned(),
            grpc_method: DEFAULT_GRPC_METHOD.to_owned(),
            websocket_path: DEFAULT_WEBSOCKET_PATH.to_owned(),
        }
    }
}

/// A fully resolved run. Immutable once handed to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub target: String,
    /// Registry key of the protocol adapter, e.g. `grpc` or `websocket`.
    pub protocol: String,
    pub concurrency: usize,
    pub duration_secs: u64,
    pub adapter: AdapterSettings,
    pub on_cycle_error: CycleErrorPolicy,
}

impl RunConfig {
    #[must_use]
    pub fn new(
        target: impl Into<String>,
        protocol: impl Into<String>,
        concurrency: usize,
        duration_secs: u64,
    ) -> Self {
        Self {
            target: target.into(),
            protocol: protocol.into(),
            concurrency,
            duration_secs,
            adapter: AdapterSettings::default(),
            on_cycle_error: CycleErrorPolicy::default(),
        }
    }

    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    /// Checks the run-level invariants.
    ///
    /// # Errors
    ///
    /// Returns an error when the target is empty or when concurrency or
    /// duration is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target.trim().is_empty() {
            return Err(ConfigError::TargetEmpty);
        }
        if self.concurrency == 0 {
            return Err(ConfigError::FieldMustBePositive {
                field: "concurrency",
            });
        }
        if self.duration_secs == 0 {
            return Err(ConfigError::FieldMustBePositive { field: "duration" });
        }
        Ok(())
    }
}
