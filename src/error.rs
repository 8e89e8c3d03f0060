//! Crate error types.

use thiserror::Error;

use crate::molecule::SmilesError;

/// Errors raised while preparing a training batch
#[derive(Debug, Error)]
pub enum PrepareError {
    /// Input string did not parse as a molecule. Fatal: callers must filter
    /// invalid molecules upstream.
    #[error("invalid SMILES: {0}")]
    InvalidSmiles(#[from] SmilesError),

    /// A permanently disabled feature was requested.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Configuration value out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal tensor-assembly failure.
    #[error("batch shape error: {0}")]
    Shape(String),
}

/// Result type for batch-preparation operations
pub type Result<T> = std::result::Result<T, PrepareError>;
