use std::time::Duration;

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Failure to establish a worker's connection. Never retried.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Timed out connecting to '{target}' after {timeout:?}")]
    Timeout { target: String, timeout: Duration },
    #[error("Failed to connect to '{target}': {source}")]
    Io {
        target: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid gRPC target '{target}': {source}")]
    InvalidGrpcUri {
        target: String,
        #[source]
        source: http::uri::InvalidUri,
    },
    #[error("Invalid WebSocket target '{target}': {source}")]
    InvalidWebSocketUrl {
        target: String,
        #[source]
        source: url::ParseError,
    },
    #[error("HTTP/2 handshake with '{target}' failed: {source}")]
    Handshake {
        target: String,
        #[source]
        source: h2::Error,
    },
    #[error("WebSocket handshake with '{url}' failed: {source}")]
    WebSocket {
        url: String,
        #[source]
        source: Box<tungstenite::Error>,
    },
}

/// Failure of a single request/response cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Request timed out after {timeout:?}")]
    Timeout { timeout: Duration },
    #[error("Failed to build request: {source}")]
    BuildRequest {
        #[source]
        source: http::Error,
    },
    #[error("HTTP/2 error: {source}")]
    Http2 {
        #[source]
        source: h2::Error,
    },
    #[error("WebSocket error: {source}")]
    WebSocket {
        #[source]
        source: Box<tungstenite::Error>,
    },
    #[error("Connection closed by peer")]
    ConnectionClosed,
    #[error("gRPC response carried no grpc-status")]
    MissingGrpcStatus,
    #[error("Unexpected HTTP status {status}")]
    HttpStatus { status: u16 },
    #[error("gRPC call failed with status {code}{}", .message.as_deref().map(|message| format!(": {message}")).unwrap_or_default())]
    GrpcStatus {
        code: String,
        message: Option<String>,
    },
}

impl CycleError {
    /// Whether the connection can carry another cycle after this failure.
    ///
    /// Transport failures leave the connection unusable; status-level
    /// failures reported by the peer do not.
    #[must_use]
    pub const fn connection_usable(&self) -> bool {
        match self {
            CycleError::HttpStatus { .. }
            | CycleError::GrpcStatus { .. }
            | CycleError::MissingGrpcStatus => true,
            CycleError::Timeout { .. }
            | CycleError::BuildRequest { .. }
            | CycleError::Http2 { .. }
            | CycleError::WebSocket { .. }
            | CycleError::ConnectionClosed => false,
        }
    }

    pub(crate) fn websocket(source: tungstenite::Error) -> Self {
        CycleError::WebSocket {
            source: Box::new(source),
        }
    }
}
