use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use http::header::{HeaderMap, HeaderValue};
use http::{Request, Response};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;

use crate::error::{AppError, AppResult};

mod websocket;

const TEST_TIMEOUT: Duration = Duration::from_secs(2);

fn run_async_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::validation(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

async fn bind_listener() -> AppResult<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|err| AppError::validation(format!("Failed to bind test server: {}", err)))?;
    let addr = listener
        .local_addr()
        .map_err(|err| AppError::validation(format!("Failed to read test addr: {}", err)))?;
    Ok((listener, addr))
}

/// An address nothing listens on.
async fn refused_addr() -> AppResult<SocketAddr> {
    let (listener, addr) = bind_listener().await?;
    drop(listener);
    Ok(addr)
}

async fn join_server(handle: JoinHandle<AppResult<usize>>) -> AppResult<usize> {
    timeout(TEST_TIMEOUT, handle)
        .await
        .map_err(|_err| AppError::validation("Server task timed out"))?
        .map_err(|err| AppError::validation(format!("Server task failed: {}", err)))?
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GrpcReply {
    /// Data frame followed by trailers carrying this `grpc-status`.
    Status(&'static str),
    /// A plain HTTP/2 200 whose body ends the stream with no trailers.
    PlainBody,
}

/// Serves unary calls on a single HTTP/2 connection, answering each as
/// `reply` says. Resolves to the number of calls accepted once the client
/// goes away.
async fn spawn_grpc_mock_server(
    reply: GrpcReply,
) -> AppResult<(SocketAddr, JoinHandle<AppResult<usize>>)> {
    let (listener, addr) = bind_listener().await?;

    let task = tokio::spawn(async move {
        let (stream, _) = timeout(TEST_TIMEOUT, listener.accept())
            .await
            .map_err(|_err| AppError::validation("gRPC accept timed out"))?
            .map_err(|err| AppError::validation(format!("gRPC accept failed: {}", err)))?;
        let mut conn = h2::server::handshake(stream).await.map_err(|err| {
            AppError::validation(format!("gRPC h2 handshake failed: {}", err))
        })?;

        let mut calls = 0_usize;
        while let Some(next) = conn.accept().await {
            let Ok((request, respond)) = next else {
                break;
            };
            calls = calls.saturating_add(1);
            tokio::spawn(respond_unary(request, respond, reply));
        }
        Ok(calls)
    });
    Ok((addr, task))
}

async fn respond_unary(
    request: Request<h2::RecvStream>,
    mut respond: h2::server::SendResponse<Bytes>,
    reply: GrpcReply,
) -> AppResult<()> {
    let mut body = request.into_body();
    while let Some(chunk) = body.data().await {
        let chunk =
            chunk.map_err(|err| AppError::validation(format!("gRPC body read failed: {}", err)))?;
        drop(body.flow_control().release_capacity(chunk.len()));
    }

    let response = Response::builder()
        .status(200)
        .header("content-type", "application/grpc")
        .body(())
        .map_err(|err| AppError::validation(format!("gRPC response build failed: {}", err)))?;
    let mut send = respond
        .send_response(response, false)
        .map_err(|err| AppError::validation(format!("gRPC send response failed: {}", err)))?;
    let grpc_status = match reply {
        GrpcReply::Status(grpc_status) => grpc_status,
        GrpcReply::PlainBody => {
            return send
                .send_data(Bytes::from_static(b"not grpc"), true)
                .map_err(|err| AppError::validation(format!("Plain send data failed: {}", err)));
        }
    };
    send.send_data(Bytes::from(super::grpc_frame(b"\x0a\x02ok")), false)
        .map_err(|err| AppError::validation(format!("gRPC send data failed: {}", err)))?;

    let mut trailers = HeaderMap::new();
    trailers.insert("grpc-status", HeaderValue::from_static(grpc_status));
    if grpc_status != "0" {
        trailers.insert("grpc-message", HeaderValue::from_static("unavailable"));
    }
    send.send_trailers(trailers)
        .map_err(|err| AppError::validation(format!("gRPC send trailers failed: {}", err)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WsBehavior {
    Echo,
    CloseOnFirstMessage,
}

/// Accepts one WebSocket client on `/ws`. Resolves to the number of
/// messages echoed once the client goes away.
async fn spawn_websocket_mock_server(
    behavior: WsBehavior,
) -> AppResult<(SocketAddr, JoinHandle<AppResult<usize>>)> {
    let (listener, addr) = bind_listener().await?;

    let task = tokio::spawn(async move {
        let (stream, _) = timeout(TEST_TIMEOUT, listener.accept())
            .await
            .map_err(|_err| AppError::validation("Websocket accept timed out"))?
            .map_err(|err| AppError::validation(format!("Websocket accept failed: {}", err)))?;

        let mut ws = timeout(TEST_TIMEOUT, accept_async(stream))
            .await
            .map_err(|_err| AppError::validation("Websocket handshake timed out"))?
            .map_err(|err| AppError::validation(format!("Websocket handshake failed: {}", err)))?;

        let mut echoed = 0_usize;
        while let Some(Ok(message)) = ws.next().await {
            if !message.is_text() && !message.is_binary() {
                continue;
            }
            if behavior == WsBehavior::CloseOnFirstMessage {
                drop(ws.close(None).await);
                break;
            }
            ws.send(message)
                .await
                .map_err(|err| AppError::validation(format!("Websocket send failed: {}", err)))?;
            echoed = echoed.saturating_add(1);
        }
        Ok(echoed)
    });
    Ok((addr, task))
}
