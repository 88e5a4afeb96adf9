mod grpc;
mod websocket;

#[cfg(test)]
mod tests;

pub use grpc::{GrpcAdapter, encode_ping_request, grpc_frame};
pub use websocket::WebSocketAdapter;
