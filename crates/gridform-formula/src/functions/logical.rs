//! Logical functions

use crate::error::FormulaResult;
use crate::evaluator::EvaluationContext;
use gridform_core::Value;

/// IF(condition, value_if_true, [value_if_false])
///
/// Both branch values are already evaluated; IF only picks one of them.
pub fn fn_if(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    if args[0].is_truthy() {
        Ok(args[1].clone())
    } else {
        Ok(args.get(2).cloned().unwrap_or_default())
    }
}

/// AND(value, ...); TRUE without arguments
pub fn fn_and(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Boolean(args.iter().all(Value::is_truthy)))
}

/// OR(value, ...); FALSE without arguments
pub fn fn_or(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Boolean(args.iter().any(Value::is_truthy)))
}

/// NOT(value)
pub fn fn_not(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Boolean(!args[0].is_truthy()))
}
