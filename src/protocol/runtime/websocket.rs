use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;
use url::Url;

use crate::domain::AdapterSettings;
use crate::error::{ConnectError, CycleError};
use crate::protocol::{Connection, MetricNames, ProtocolAdapter, RequestOutcome};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Upper bound on flushing the close frame to a stalled peer.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Persistent WebSocket session: one socket per worker, one text message
/// out and one data message back per cycle.
#[derive(Debug, Clone)]
pub struct WebSocketAdapter {
    connect_timeout: Duration,
    request_timeout: Option<Duration>,
    path: String,
    message: String,
}

impl WebSocketAdapter {
    pub const NAME: &'static str = "websocket";

    #[must_use]
    pub fn new(settings: &AdapterSettings) -> Self {
        let path = if settings.websocket_path.starts_with('/') {
            settings.websocket_path.clone()
        } else {
            format!("/{}", settings.websocket_path)
        };
        Self {
            connect_timeout: settings.connect_timeout,
            request_timeout: settings.request_timeout,
            path,
            message: settings.message.clone(),
        }
    }

    /// `ws://{target}{path}`; plaintext unless the target already names a
    /// scheme.
    ///
    /// # Errors
    ///
    /// Returns an error when the resulting URL does not parse.
    pub fn url_for(&self, target: &str) -> Result<Url, ConnectError> {
        let raw = if target.starts_with("ws://") || target.starts_with("wss://") {
            format!("{}{}", target.trim_end_matches('/'), self.path)
        } else {
            format!("ws://{}{}", target, self.path)
        };
        Url::parse(&raw).map_err(|source| ConnectError::InvalidWebSocketUrl {
            target: target.to_owned(),
            source,
        })
    }
}

#[async_trait]
impl ProtocolAdapter for WebSocketAdapter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn display_name(&self) -> &'static str {
        "WebSocket"
    }

    fn metric_names(&self) -> MetricNames {
        MetricNames {
            success: "ws.success",
            latency: "ws.latency",
        }
    }

    async fn connect(&self, target: &str) -> Result<Box<dyn Connection>, ConnectError> {
        let url = self.url_for(target)?;
        let (stream, _response) = timeout(self.connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_elapsed| ConnectError::Timeout {
                target: target.to_owned(),
                timeout: self.connect_timeout,
            })?
            .map_err(|source| ConnectError::WebSocket {
                url: url.to_string(),
                source: Box::new(source),
            })?;

        Ok(Box::new(WebSocketConnection {
            stream,
            message: self.message.clone(),
            request_timeout: self.request_timeout,
            closed: false,
        }))
    }
}

struct WebSocketConnection {
    stream: WsStream,
    message: String,
    request_timeout: Option<Duration>,
    closed: bool,
}

impl WebSocketConnection {
    async fn round_trip(&mut self) -> Result<(), CycleError> {
        self.stream
            .send(Message::Text(self.message.clone()))
            .await
            .map_err(CycleError::websocket)?;

        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(_) | Message::Binary(_))) => return Ok(()),
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                Some(Ok(Message::Close(_))) | None => return Err(CycleError::ConnectionClosed),
                Some(Err(err)) => return Err(CycleError::websocket(err)),
            }
        }
    }
}

#[async_trait]
impl Connection for WebSocketConnection {
    async fn execute_once(&mut self) -> RequestOutcome {
        let request_timeout = self.request_timeout;
        let start = Instant::now();
        let result = match request_timeout {
            Some(limit) => timeout(limit, self.round_trip())
                .await
                .unwrap_or_else(|_elapsed| Err(CycleError::Timeout { timeout: limit })),
            None => self.round_trip().await,
        };
        RequestOutcome::from_result(start.elapsed(), result)
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        match timeout(CLOSE_TIMEOUT, self.stream.close(None)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => debug!("WebSocket close failed: {}", err),
            Err(_elapsed) => debug!("WebSocket close timed out after {:?}", CLOSE_TIMEOUT),
        }
    }
}
