//! # gridform
//!
//! Formula fields for data grids.
//!
//! gridform evaluates spreadsheet-style formulas over the named fields of a record:
//!
//! - Parse formulas such as `IF({Score} >= 90, {Name} & " - Excellent!", "")`
//! - Register formula fields and reject circular dependencies up front
//! - Calculate every field of a record in dependency order
//! - Render results with display formats (number, currency, percentage, dates)
//! - Attach a provenance descriptor to every computed value
//! - Save and load registry configurations as JSON
//!
//! ## Example
//!
//! ```rust
//! use gridform::prelude::*;
//!
//! let mut registry = FormulaFieldRegistry::new();
//! registry.register_formula("Total", "{Price} * {Quantity}").unwrap();
//!
//! let mut record = Record::new();
//! record.set("Price", 100.0);
//! record.set("Quantity", 5.0);
//!
//! let result = registry.calculate("Total", &record).unwrap();
//! assert_eq!(result.value, Value::Number(500.0));
//! assert_eq!(result.formatted_value, "500.00");
//! ```

pub mod error;
pub mod json;
pub mod prelude;
pub mod provenance;
pub mod registry;

pub use error::{Error, Result};
pub use json::{record_from_json, record_from_str, record_to_json};
pub use provenance::{describe, ProvenanceAgent, ProvenanceDescriptor, ProvenanceSource};
pub use registry::{
    CalculationOptions, CalculationReport, EvalResult, FormulaFieldConfig, FormulaFieldRegistry,
    FormulaFieldSpec, ERROR_INDICATOR,
};

// Re-export core types
pub use gridform_core::{
    format_value, parse_date, DisplayFormat, FieldValue, MostRecentObservation, Observation,
    Record, SuperposedCell, Value, ValueResolver, ViewContext, MAX_DECIMALS,
};

// Re-export formula types
pub use gridform_formula::{
    builtin_functions, evaluate, parse, DependencyGraph, EvaluationContext, FormulaError,
    FormulaExpr, ParseError, ParseResult, MAX_NESTING_DEPTH,
};
