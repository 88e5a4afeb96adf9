use std::time::Duration;

use crate::error::CycleError;

/// Result of one request/response cycle. Produced by a connection and
/// consumed immediately by the worker that ran it.
#[derive(Debug)]
pub struct RequestOutcome {
    pub latency: Duration,
    pub error: Option<CycleError>,
}

impl RequestOutcome {
    #[must_use]
    pub const fn success(latency: Duration) -> Self {
        Self {
            latency,
            error: None,
        }
    }

    #[must_use]
    pub const fn failure(latency: Duration, error: CycleError) -> Self {
        Self {
            latency,
            error: Some(error),
        }
    }

    #[must_use]
    pub fn from_result(latency: Duration, result: Result<(), CycleError>) -> Self {
        match result {
            Ok(()) => Self::success(latency),
            Err(error) => Self::failure(latency, error),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
