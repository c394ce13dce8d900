//! Error types for the value-function core.

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Bad construction argument (non-positive sizes, negative variance,
    /// inverted or non-finite output bounds)
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A vector's length disagrees with the length the network expects
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A computation left the valid numeric domain
    #[error("numeric domain error: {0}")]
    NumericDomain(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
