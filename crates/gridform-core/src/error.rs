//! Error types for gridform-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gridform-core
#[derive(Debug, Error)]
pub enum Error {
    /// Unrecognized display format name
    #[error("Invalid display format: {0}")]
    InvalidDisplayFormat(String),

    /// Record data that cannot be mapped onto field values
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}
