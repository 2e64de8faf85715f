use thiserror::Error;

/// chargestat error types
#[derive(Error, Debug)]
pub enum ChargestatError {
    /// Malformed input: wire dates, amounts, JSON payloads
    #[error("parse error: {0}")]
    Parse(String),

    /// Caller contract violation (unknown granularity, inverted range, ...)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Revenue endpoint request failed
    #[error("api error: {0}")]
    Api(String),

    /// Cache operation failed
    #[error("cache error: {0}")]
    Cache(String),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for chargestat
pub type Result<T> = std::result::Result<T, ChargestatError>;
