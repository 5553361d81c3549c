//! Error types for formula field management

use gridform_formula::ParseError;
use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the formula field registry
#[derive(Debug, Error)]
pub enum Error {
    /// Formula failed to parse
    #[error("Invalid formula for field '{field}': {source}")]
    InvalidFormula {
        field: String,
        #[source]
        source: ParseError,
    },

    /// Registering the field would make it depend on itself
    #[error("Circular dependency detected: {}", .cycle.join(" -> "))]
    CircularDependency { field: String, cycle: Vec<String> },

    /// No formula field registered under this name
    #[error("Unknown formula field: {0}")]
    UnknownField(String),

    /// Core value/format error
    #[error(transparent)]
    Core(#[from] gridform_core::Error),

    /// Configuration (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
