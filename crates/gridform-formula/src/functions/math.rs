//! Math functions

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::EvaluationContext;
use gridform_core::Value;

fn numbers(args: &[Value]) -> impl Iterator<Item = f64> + '_ {
    args.iter().map(Value::to_number)
}

/// SUM(number, ...)
pub fn fn_sum(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Number(numbers(args).sum()))
}

/// AVG(number, ...); NaN when called without arguments
pub fn fn_avg(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    if args.is_empty() {
        return Ok(Value::Number(f64::NAN));
    }
    let sum: f64 = numbers(args).sum();
    Ok(Value::Number(sum / args.len() as f64))
}

/// MIN(number, ...)
pub fn fn_min(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Number(numbers(args).fold(f64::INFINITY, f64::min)))
}

/// MAX(number, ...)
pub fn fn_max(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Number(numbers(args).fold(f64::NEG_INFINITY, f64::max)))
}

/// ROUND(number, [decimals])
///
/// Half away from zero; negative `decimals` round to the left of the decimal point.
pub fn fn_round(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let number = args[0].to_number();
    let decimals = args.get(1).map(|v| v.to_number().trunc() as i32).unwrap_or(0);

    let multiplier = 10_f64.powi(decimals);
    // f64::round already rounds half away from zero
    Ok(Value::Number((number * multiplier).round() / multiplier))
}

/// ABS(number)
pub fn fn_abs(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Number(args[0].to_number().abs()))
}

/// SQRT(number); NaN for negative input
pub fn fn_sqrt(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Number(args[0].to_number().sqrt()))
}

/// POWER(base, exponent)
pub fn fn_power(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Number(args[0].to_number().powf(args[1].to_number())))
}

/// MOD(number, divisor); the result takes the sign of `number`
pub fn fn_mod(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let divisor = args[1].to_number();
    if divisor == 0.0 {
        return Err(FormulaError::DivisionByZero);
    }
    Ok(Value::Number(args[0].to_number() % divisor))
}
