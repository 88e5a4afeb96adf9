use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use h2::client::SendRequest;
use http::header::{CONTENT_TYPE, HeaderMap, TE};
use http::{Method, Request, StatusCode, Uri};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout};
use tracing::debug;

use crate::domain::AdapterSettings;
use crate::error::{ConnectError, CycleError};
use crate::protocol::{Connection, MetricNames, ProtocolAdapter, RequestOutcome};

/// Unary gRPC over plaintext HTTP/2 (prior knowledge). One HTTP/2
/// connection per worker; every cycle is one call on a fresh stream.
#[derive(Debug, Clone)]
pub struct GrpcAdapter {
    connect_timeout: Duration,
    request_timeout: Option<Duration>,
    method: String,
    payload: Bytes,
}

impl GrpcAdapter {
    pub const NAME: &'static str = "grpc";

    #[must_use]
    pub fn new(settings: &AdapterSettings) -> Self {
        let method = if settings.grpc_method.starts_with('/') {
            settings.grpc_method.clone()
        } else {
            format!("/{}", settings.grpc_method)
        };
        Self {
            connect_timeout: settings.connect_timeout,
            request_timeout: settings.request_timeout,
            method,
            payload: Bytes::from(grpc_frame(&encode_ping_request(&settings.message))),
        }
    }
}

#[async_trait]
impl ProtocolAdapter for GrpcAdapter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn display_name(&self) -> &'static str {
        "gRPC Unary"
    }

    fn metric_names(&self) -> MetricNames {
        MetricNames {
            success: "grpc.success",
            latency: "grpc.latency",
        }
    }

    async fn connect(&self, target: &str) -> Result<Box<dyn Connection>, ConnectError> {
        let uri: Uri = format!("http://{}{}", target, self.method)
            .parse()
            .map_err(|source| ConnectError::InvalidGrpcUri {
                target: target.to_owned(),
                source,
            })?;

        let establish = async {
            let stream = TcpStream::connect(target)
                .await
                .map_err(|source| ConnectError::Io {
                    target: target.to_owned(),
                    source,
                })?;
            if let Err(err) = stream.set_nodelay(true) {
                debug!("Failed to set TCP_NODELAY for '{}': {}", target, err);
            }
            let (sender, connection) = h2::client::handshake(stream).await.map_err(|source| {
                ConnectError::Handshake {
                    target: target.to_owned(),
                    source,
                }
            })?;
            let driver = tokio::spawn(async move {
                if let Err(err) = connection.await {
                    debug!("gRPC connection ended: {}", err);
                }
            });
            match sender.ready().await {
                Ok(sender) => Ok((sender, driver)),
                Err(source) => {
                    driver.abort();
                    Err(ConnectError::Handshake {
                        target: target.to_owned(),
                        source,
                    })
                }
            }
        };

        let (sender, driver) = timeout(self.connect_timeout, establish)
            .await
            .map_err(|_elapsed| ConnectError::Timeout {
                target: target.to_owned(),
                timeout: self.connect_timeout,
            })??;

        Ok(Box::new(GrpcConnection {
            sender,
            uri,
            payload: self.payload.clone(),
            request_timeout: self.request_timeout,
            driver: Some(driver),
        }))
    }
}

struct GrpcConnection {
    sender: SendRequest<Bytes>,
    uri: Uri,
    payload: Bytes,
    request_timeout: Option<Duration>,
    driver: Option<JoinHandle<()>>,
}

impl GrpcConnection {
    async fn unary_call(&mut self) -> Result<(), CycleError> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.uri.clone())
            .header(CONTENT_TYPE, "application/grpc")
            .header(TE, "trailers")
            .body(())
            .map_err(|source| CycleError::BuildRequest { source })?;

        let mut sender = self.sender.clone().ready().await.map_err(http2_error)?;
        let (response, mut body_tx) = sender.send_request(request, false).map_err(http2_error)?;
        body_tx
            .send_data(self.payload.clone(), true)
            .map_err(http2_error)?;

        let (parts, mut body) = response.await.map_err(http2_error)?.into_parts();
        if parts.status != StatusCode::OK {
            return Err(CycleError::HttpStatus {
                status: parts.status.as_u16(),
            });
        }
        // Trailers-only responses carry the status in the headers.
        if let Some(result) = grpc_status(&parts.headers) {
            return result;
        }

        while let Some(chunk) = body.data().await {
            let chunk = chunk.map_err(http2_error)?;
            drop(body.flow_control().release_capacity(chunk.len()));
        }
        let trailers = body.trailers().await.map_err(http2_error)?;
        trailers
            .as_ref()
            .and_then(grpc_status)
            .unwrap_or(Err(CycleError::MissingGrpcStatus))
    }
}

#[async_trait]
impl Connection for GrpcConnection {
    async fn execute_once(&mut self) -> RequestOutcome {
        let request_timeout = self.request_timeout;
        let start = Instant::now();
        let result = match request_timeout {
            Some(limit) => timeout(limit, self.unary_call())
                .await
                .unwrap_or_else(|_elapsed| Err(CycleError::Timeout { timeout: limit })),
            None => self.unary_call().await,
        };
        RequestOutcome::from_result(start.elapsed(), result)
    }

    async fn close(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

impl Drop for GrpcConnection {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

fn http2_error(source: h2::Error) -> CycleError {
    CycleError::Http2 { source }
}

/// `None` when the map carries no `grpc-status`.
fn grpc_status(headers: &HeaderMap) -> Option<Result<(), CycleError>> {
    let raw = headers.get("grpc-status")?;
    let code = raw.to_str().map_or("unknown", str::trim);
    if code == "0" {
        return Some(Ok(()));
    }
    let message = headers
        .get("grpc-message")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    Some(Err(CycleError::GrpcStatus {
        code: code.to_owned(),
        message,
    }))
}

/// Encodes `{ 1: string message }`, the ping request body, as protobuf.
#[must_use]
pub fn encode_ping_request(message: &str) -> Vec<u8> {
    let bytes = message.as_bytes();
    let mut encoded = Vec::with_capacity(bytes.len().saturating_add(11));
    if bytes.is_empty() {
        return encoded;
    }
    // Field 1, wire type 2 (length-delimited).
    encoded.push(0x0a);
    let mut len = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    while len >= 0x80 {
        encoded.push(u8::try_from(len & 0x7f).unwrap_or(0) | 0x80);
        len >>= 7;
    }
    encoded.push(u8::try_from(len).unwrap_or(0));
    encoded.extend_from_slice(bytes);
    encoded
}

/// Wraps a message in the gRPC length-prefixed frame (uncompressed).
#[must_use]
pub fn grpc_frame(payload: &[u8]) -> Vec<u8> {
    let payload_len = u32::try_from(payload.len()).map_or(u32::MAX, |value| value);
    let mut framed = Vec::with_capacity(payload.len().saturating_add(5));
    framed.push(0);
    framed.extend_from_slice(&payload_len.to_be_bytes());
    framed.extend_from_slice(payload);
    framed
}
