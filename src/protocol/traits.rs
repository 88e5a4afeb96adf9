use async_trait::async_trait;

use crate::error::ConnectError;

use super::RequestOutcome;

/// Metric names a protocol reports one successful cycle under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricNames {
    pub success: &'static str,
    pub latency: &'static str,
}

/// Opens connections for one wire protocol.
///
/// Adapters are shared by every worker of a run, so `connect` takes `&self`
/// and each returned [`Connection`] is owned by exactly one worker.
#[async_trait]
pub trait ProtocolAdapter: Send + Sync {
    /// Registry key, lowercase.
    fn name(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    fn metric_names(&self) -> MetricNames;

    /// Establishes a session with `target`. A single attempt; callers treat
    /// failure as final.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectError`] when the transport or handshake fails or
    /// does not finish within the connect timeout.
    async fn connect(&self, target: &str) -> Result<Box<dyn Connection>, ConnectError>;
}

/// An open session owned by a single worker.
#[async_trait]
pub trait Connection: Send {
    /// Sends one request and waits for its full response. Latency covers the
    /// span from just before the send to just after the response is read.
    async fn execute_once(&mut self) -> RequestOutcome;

    /// Releases transport resources. Safe to call more than once and on a
    /// connection that already failed.
    async fn close(&mut self);
}
