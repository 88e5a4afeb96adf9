//! Protocol adapters and the registry the driver resolves them from.
mod builtins;
mod outcome;
mod registry;
mod runtime;
mod traits;


pub use outcome::RequestOutcome;
pub use registry::{AdapterConstructor, ProtocolRegistry};
pub use runtime::{GrpcAdapter, WebSocketAdapter, encode_ping_request, grpc_frame};
pub use traits::{Connection, MetricNames, ProtocolAdapter};
