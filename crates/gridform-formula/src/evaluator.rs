//! Formula evaluator
//!
//! Walks a formula AST against a record and produces a [`Value`]. All type coercion lives
//! here and in [`Value`]; the function library only sees already-evaluated arguments.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::builtin_functions;
use chrono::{DateTime, Utc};
use gridform_core::{FieldValue, MostRecentObservation, Record, Value, ValueResolver, ViewContext};
use once_cell::sync::Lazy;

static EMPTY_RECORD: Lazy<Record> = Lazy::new(Record::new);

/// Context for formula evaluation
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Record the formula reads its fields from
    pub record: &'a Record,
    /// Host-supplied resolver for superposed cells; the recency fallback is used when absent
    pub resolver: Option<&'a dyn ValueResolver>,
    /// View handed to the resolver
    pub view: Option<&'a ViewContext>,
    /// Fixed instant for TODAY()/NOW(); the system clock when absent
    pub now: Option<DateTime<Utc>>,
}

impl<'a> EvaluationContext<'a> {
    /// Create a context over `record` with default settings
    pub fn new(record: &'a Record) -> Self {
        Self {
            record,
            resolver: None,
            view: None,
            now: None,
        }
    }

    /// Create a context over an empty record (for testing)
    pub fn simple() -> EvaluationContext<'static> {
        EvaluationContext::new(&EMPTY_RECORD)
    }

    /// Use `resolver` for superposed cells
    pub fn with_resolver(mut self, resolver: &'a dyn ValueResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Pass `view` to the resolver
    pub fn with_view(mut self, view: &'a ViewContext) -> Self {
        self.view = Some(view);
        self
    }

    /// Pin the current instant
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Current instant as seen by TODAY()/NOW()
    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    /// Value a `{name}` reference evaluates to.
    ///
    /// Absent fields are [`Value::Empty`]. Superposed cells go through the supplied resolver,
    /// or [`MostRecentObservation`] when there is none.
    pub fn field_value(&self, name: &str) -> Value {
        match self.record.get(name) {
            None => Value::Empty,
            Some(FieldValue::Scalar(v)) => v.clone(),
            Some(FieldValue::Superposed(cell)) => {
                let default_view = ViewContext::default();
                let view = self.view.unwrap_or(&default_view);
                match self.resolver {
                    Some(resolver) => resolver.resolve(cell, view),
                    None => MostRecentObservation.resolve(cell, view),
                }
            }
        }
    }
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<Value> {
    match expr {
        FormulaExpr::Literal(v) => Ok(v.clone()),

        FormulaExpr::FieldRef(name) => Ok(ctx.field_value(name)),

        FormulaExpr::Unary { op, operand } => evaluate_unary_op(*op, operand, ctx),

        FormulaExpr::Binary { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        FormulaExpr::Call { name, args } => evaluate_function(name, args, ctx),
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<Value> {
    // Evaluate operands first
    let left_val = evaluate(left, ctx)?;
    let right_val = evaluate(right, ctx)?;

    let value = match op {
        // Arithmetic operators
        BinaryOperator::Add => Value::Number(left_val.to_number() + right_val.to_number()),
        BinaryOperator::Subtract => Value::Number(left_val.to_number() - right_val.to_number()),
        BinaryOperator::Multiply => Value::Number(left_val.to_number() * right_val.to_number()),
        BinaryOperator::Divide => {
            let divisor = right_val.to_number();
            if divisor == 0.0 {
                return Err(FormulaError::DivisionByZero);
            }
            Value::Number(left_val.to_number() / divisor)
        }
        BinaryOperator::Modulo => {
            let divisor = right_val.to_number();
            if divisor == 0.0 {
                return Err(FormulaError::DivisionByZero);
            }
            Value::Number(left_val.to_number() % divisor)
        }
        BinaryOperator::Power => Value::Number(left_val.to_number().powf(right_val.to_number())),

        // Equality is strict: no coercion
        BinaryOperator::Equal => Value::Boolean(left_val == right_val),
        BinaryOperator::NotEqual => Value::Boolean(left_val != right_val),

        // Ordering compares numerically
        BinaryOperator::LessThan => Value::Boolean(left_val.to_number() < right_val.to_number()),
        BinaryOperator::LessEqual => Value::Boolean(left_val.to_number() <= right_val.to_number()),
        BinaryOperator::GreaterThan => Value::Boolean(left_val.to_number() > right_val.to_number()),
        BinaryOperator::GreaterEqual => {
            Value::Boolean(left_val.to_number() >= right_val.to_number())
        }

        // Concatenation
        BinaryOperator::Concat => Value::String(left_val.to_text() + &right_val.to_text()),
    };

    Ok(value)
}

/// Evaluate a unary operation
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<Value> {
    let val = evaluate(operand, ctx)?;

    Ok(match op {
        UnaryOperator::Negate => Value::Number(-val.to_number()),
        UnaryOperator::Plus => Value::Number(val.to_number()),
        UnaryOperator::Not => Value::Boolean(!val.is_truthy()),
    })
}

/// Evaluate a function call.
///
/// Arguments are evaluated eagerly, left to right, before the function runs. This holds for
/// IF too: both branches are computed and IF only chooses between the results.
fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<Value> {
    let func = builtin_functions()
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    // Check argument count
    if args.len() < func.min_args {
        return Err(FormulaError::ArgumentCount {
            function: name.to_string(),
            expected: format!("at least {}", func.min_args),
            actual: args.len(),
        });
    }

    if let Some(max) = func.max_args {
        if args.len() > max {
            return Err(FormulaError::ArgumentCount {
                function: name.to_string(),
                expected: format!("at most {}", max),
                actual: args.len(),
            });
        }
    }

    // Evaluate arguments
    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        evaluated_args.push(evaluate(arg, ctx)?);
    }

    // Call the function
    (func.implementation)(&evaluated_args, ctx)
}
