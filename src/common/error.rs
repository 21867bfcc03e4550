//! Error handling for prism-stream aggregators

use thiserror::Error;

/// Main error type for aggregation operations
#[derive(Error, Debug)]
pub enum PrismStreamError {
    /// Wrong number of input expressions at aggregator initialization
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Declared input type outside the set an aggregate supports
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Operation that a unary aggregate can never perform (batch add/remove)
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Snapshot that does not match the schema of the accumulator restoring it
    #[error("Malformed state: {0}")]
    MalformedState(String),

    /// Value whose variant does not match the resolved input type
    #[error("Type error: {0}")]
    Type(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for aggregation operations
pub type PrismStreamResult<T> = std::result::Result<T, PrismStreamError>;

/// Macro for creating malformed state errors
#[macro_export]
macro_rules! malformed_state_err {
    ($msg:expr) => {
        $crate::common::error::PrismStreamError::MalformedState($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::common::error::PrismStreamError::MalformedState(format!($fmt, $($arg)*))
    };
}

/// Macro for creating unsupported type errors
#[macro_export]
macro_rules! unsupported_type_err {
    ($msg:expr) => {
        $crate::common::error::PrismStreamError::UnsupportedType($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::common::error::PrismStreamError::UnsupportedType(format!($fmt, $($arg)*))
    };
}
