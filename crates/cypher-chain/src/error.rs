//! Error types for the chain data model.

use thiserror::Error;

/// Errors raised by the chain data model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// A hex string could not be decoded.
    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    /// Decoded bytes had the wrong length.
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
