//! Run-level types shared by the driver, the adapters and the entry point.
mod run;

pub use run::{
    AdapterSettings, CycleErrorPolicy, DEFAULT_CONNECT_TIMEOUT, DEFAULT_GRPC_METHOD,
    DEFAULT_MESSAGE, DEFAULT_WEBSOCKET_PATH, RunConfig,
};
