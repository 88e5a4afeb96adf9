mod app;
mod config;
mod sink;
mod transport;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use sink::SinkError;
pub use transport::{ConnectError, CycleError};
pub use validation::ValidationError;
