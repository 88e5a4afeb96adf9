use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to resolve StatsD address '{addr}': {source}")]
    Resolve {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("StatsD address '{addr}' did not resolve to any socket address.")]
    NoAddress { addr: String },
    #[error("Failed to open StatsD socket for '{addr}': {source}")]
    Socket {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
