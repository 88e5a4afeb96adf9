use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Unsupported protocol '{protocol}'. Supported protocols: {supported}.")]
    UnsupportedProtocol { protocol: String, supported: String },
    #[error("Protocol adapter already registered: {protocol}")]
    DuplicateProtocol { protocol: String },
    #[error("Protocol name must not be empty.")]
    EmptyProtocolName,
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
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
