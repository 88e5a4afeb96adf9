use std::time::Duration;

use serde::Deserialize;

use crate::domain::CycleErrorPolicy;
use crate::error::ConfigError;

use super::parse::parse_duration_value;

/// On-disk run description. Every field is optional so CLI flags can fill
/// the gaps.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub target: Option<String>,
    pub protocol: Option<String>,
    pub concurrency: Option<usize>,
    /// Whole seconds, either as a number or a string such as `"2m"`.
    pub duration: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    pub request_timeout: Option<DurationValue>,
    pub message: Option<String>,
    pub grpc_method: Option<String>,
    pub websocket_path: Option<String>,
    pub on_cycle_error: Option<CycleErrorPolicy>,
    pub metrics: Option<MetricsConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MetricsConfig {
    pub statsd_addr: Option<String>,
    pub prefix: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ConfigError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ConfigError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(value) => parse_duration_value(value),
        }
    }
}
