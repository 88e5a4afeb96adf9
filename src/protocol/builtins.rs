use std::sync::Arc;

use crate::domain::AdapterSettings;

use super::ProtocolAdapter;
use super::runtime::{GrpcAdapter, WebSocketAdapter};

type BuiltinConstructor = fn(&AdapterSettings) -> Arc<dyn ProtocolAdapter>;

fn grpc(settings: &AdapterSettings) -> Arc<dyn ProtocolAdapter> {
    Arc::new(GrpcAdapter::new(settings))
}

fn websocket(settings: &AdapterSettings) -> Arc<dyn ProtocolAdapter> {
    Arc::new(WebSocketAdapter::new(settings))
}

pub(super) const fn builtins() -> [(&'static str, BuiltinConstructor); 2] {
    [
        (GrpcAdapter::NAME, grpc as BuiltinConstructor),
        (WebSocketAdapter::NAME, websocket as BuiltinConstructor),
    ]
}
