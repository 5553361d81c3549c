//! Prelude module - common imports for gridform users
//!
//! ```rust
//! use gridform::prelude::*;
//! ```

pub use crate::{
    // Calculation types
    CalculationOptions,
    CalculationReport,
    // Display
    DisplayFormat,
    // Error types
    Error,
    EvalResult,
    // Registry types
    FormulaFieldRegistry,
    FormulaFieldSpec,
    // Record types
    Observation,
    Record,
    Result,
    SuperposedCell,
    Value,
    ValueResolver,
    ViewContext,
};
