//! # gridform-formula
//!
//! Formula parser and evaluator for gridform.
//!
//! This crate provides:
//! - Formula parsing (text → AST plus referenced fields)
//! - Formula evaluation (AST + record → value)
//! - Built-in functions (math, logical, text, date, info)
//! - Dependency tracking between formula fields
//!
//! ## Example
//!
//! ```rust
//! use gridform_core::{Record, Value};
//! use gridform_formula::{evaluate, parse, EvaluationContext};
//!
//! let parsed = parse("{Price} * {Quantity}");
//! assert!(parsed.dependencies.contains("Price"));
//!
//! let record: Record = [("Price", 2.5), ("Quantity", 4.0)].into_iter().collect();
//! let ast = parsed.ast.unwrap();
//! let value = evaluate(&ast, &EvaluationContext::new(&record)).unwrap();
//! assert_eq!(value, Value::Number(10.0));
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;

pub use ast::{BinaryOperator, FormulaExpr, UnaryOperator};
pub use dependency::DependencyGraph;
pub use error::{FormulaError, FormulaResult, ParseError};
pub use evaluator::{evaluate, EvaluationContext};
pub use functions::{builtin_functions, FunctionCategory, FunctionDef, FunctionRegistry};
pub use parser::{parse, ParseResult, MAX_NESTING_DEPTH};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{evaluate, parse, EvaluationContext, FormulaResult};
    use chrono::{DateTime, Utc};
    use gridform_core::{Record, Value};

    fn eval_in(formula: &str, ctx: &EvaluationContext) -> FormulaResult<Value> {
        let parsed = parse(formula);
        let ast = match parsed.ast {
            Some(ast) => ast,
            None => panic!("{formula}: {:?}", parsed.error),
        };
        evaluate(&ast, ctx)
    }

    /// Parse and evaluate against an empty record
    pub fn eval(formula: &str) -> FormulaResult<Value> {
        eval_in(formula, &EvaluationContext::simple())
    }

    pub fn eval_record(formula: &str, record: &Record) -> FormulaResult<Value> {
        eval_in(formula, &EvaluationContext::new(record))
    }

    /// Evaluate with a fixed clock
    pub fn eval_at(formula: &str, now: DateTime<Utc>) -> FormulaResult<Value> {
        eval_in(formula, &EvaluationContext::simple().with_now(now))
    }
}
