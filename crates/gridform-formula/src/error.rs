//! Formula error types

use thiserror::Error;

/// Result type for formula evaluation
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Syntax errors found while parsing a formula.
///
/// Positions are byte offsets into the formula source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// String literal without its closing quote
    #[error("Unterminated string starting at position {position}")]
    UnterminatedString { position: usize },

    /// `{` without a matching `}`
    #[error("Unterminated field reference starting at position {position}")]
    UnterminatedFieldReference { position: usize },

    /// Character that cannot start or continue an expression here
    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },

    /// Grouping or call without its closing `)`
    #[error("Expected closing parenthesis at position {position}")]
    ExpectedClosingParen { position: usize },

    /// Bare identifier that is neither TRUE/FALSE nor a function call
    #[error("Unexpected identifier '{name}' at position {position}")]
    UnexpectedIdentifier { name: String, position: usize },

    /// Groupings, calls or operators nested past [`crate::parser::MAX_NESTING_DEPTH`]
    #[error("Formula is nested too deeply at position {position}")]
    TooDeeplyNested { position: usize },

    /// Formula ended where an operand was required
    #[error("Unexpected end of formula")]
    UnexpectedEnd,
}

/// Errors raised while evaluating a formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Function name not in the built-in library
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Division (or modulo) by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Argument value a function cannot work with (e.g. an unknown date unit)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
