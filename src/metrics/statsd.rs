use std::net::{ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::error::SinkError;

use super::sink::{MetricEvent, MetricsSink};

pub const DEFAULT_STATSD_ADDR: &str = "localhost:8125";
pub const DEFAULT_STATSD_PREFIX: &str = "loadtest";

/// Best-effort StatsD client: one UDP datagram per event on a non-blocking
/// socket. A full socket buffer or an unreachable collector drops the event.
#[derive(Debug)]
pub struct StatsdSink {
    socket: UdpSocket,
    prefix: String,
    sent: AtomicU64,
    dropped: AtomicU64,
}

impl StatsdSink {
    /// Opens a UDP socket connected to the collector at `addr`.
    ///
    /// # Errors
    ///
    /// Returns an error when the address does not resolve or the socket
    /// cannot be created.
    pub fn connect(addr: &str, prefix: &str) -> Result<Self, SinkError> {
        let endpoint = addr
            .to_socket_addrs()
            .map_err(|source| SinkError::Resolve {
                addr: addr.to_owned(),
                source,
            })?
            .next()
            .ok_or_else(|| SinkError::NoAddress {
                addr: addr.to_owned(),
            })?;
        let bind_addr = if endpoint.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket_error = |source| SinkError::Socket {
            addr: addr.to_owned(),
            source,
        };
        let socket = UdpSocket::bind(bind_addr).map_err(socket_error)?;
        socket.connect(endpoint).map_err(socket_error)?;
        socket.set_nonblocking(true).map_err(socket_error)?;

        Ok(Self {
            socket,
            prefix: prefix.trim_end_matches('.').to_owned(),
            sent: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        })
    }

    #[must_use]
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl MetricsSink for StatsdSink {
    fn record(&self, event: MetricEvent<'_>) {
        let line = format_statsd_line(&self.prefix, &event);
        match self.socket.send(line.as_bytes()) {
            Ok(_) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("Dropped StatsD event '{}': {}", event.name(), err);
            }
        }
    }
}

/// Formats an event in the StatsD line protocol.
///
/// Counters use `|c`; latencies use `|ms` with microsecond precision.
#[must_use]
pub fn format_statsd_line(prefix: &str, event: &MetricEvent<'_>) -> String {
    let name = event.name();
    let bucket = if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{}.{}", prefix, name)
    };
    match event {
        MetricEvent::Increment { delta, .. } => format!("{}:{}|c", bucket, delta),
        MetricEvent::Latency { value, .. } => {
            let micros = value.as_micros();
            let fraction = micros % 1000;
            if fraction == 0 {
                format!("{}:{}|ms", bucket, micros / 1000)
            } else {
                format!("{}:{}.{:03}|ms", bucket, micros / 1000, fraction)
            }
        }
    }
}
