//! Counting, type-test and conversion functions

use crate::error::FormulaResult;
use crate::evaluator::EvaluationContext;
use gridform_core::{Value, MAX_DECIMALS};

/// COUNT(value, ...): arguments that are not empty
pub fn fn_count(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let n = args.iter().filter(|v| !v.is_empty()).count();
    Ok(Value::Number(n as f64))
}

/// COUNTA(value, ...): arguments that are neither empty nor the empty string
pub fn fn_counta(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let n = args.iter().filter(|v| !v.is_blank()).count();
    Ok(Value::Number(n as f64))
}

/// COUNTBLANK(value, ...)
pub fn fn_countblank(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let n = args.iter().filter(|v| v.is_blank()).count();
    Ok(Value::Number(n as f64))
}

/// ISBLANK(value)
pub fn fn_isblank(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Boolean(args[0].is_blank()))
}

/// ISNUMBER(value); NaN is not a number here
pub fn fn_isnumber(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Boolean(matches!(args[0], Value::Number(n) if !n.is_nan())))
}

/// ISTEXT(value)
pub fn fn_istext(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Boolean(matches!(args[0], Value::String(_))))
}

/// ISERROR(value)
///
/// Evaluation errors abort the whole formula, so the only error-like values an argument can
/// carry are NaN and the infinities.
pub fn fn_iserror(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Boolean(matches!(args[0], Value::Number(n) if !n.is_finite())))
}

/// VALUE(text)
pub fn fn_value(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Number(args[0].to_number()))
}

/// TEXT(value, [decimals]); decimals are clamped to [`MAX_DECIMALS`]
pub fn fn_text(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let text = match (&args[0], args.get(1)) {
        (Value::Number(n), Some(decimals)) if n.is_finite() => {
            let decimals = super::to_count(decimals).min(MAX_DECIMALS as usize);
            format!("{:.*}", decimals, n)
        }
        (v, _) => v.to_text(),
    };
    Ok(Value::String(text))
}

/// BLANK()
pub fn fn_blank(_args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Empty)
}

#[cfg(test)]
mod tests {
    use crate::test_support::{eval, eval_record};
    use gridform_core::{Record, Value, MAX_DECIMALS};

    #[test]
    fn test_counting() {
        let record: Record = [("Name", Value::string("")), ("Qty", Value::Number(0.0))]
            .into_iter()
            .collect();

        assert_eq!(
            eval_record("COUNT({Name}, {Qty}, {Missing})", &record),
            Ok(Value::Number(2.0))
        );
        assert_eq!(
            eval_record("COUNTA({Name}, {Qty}, {Missing})", &record),
            Ok(Value::Number(1.0))
        );
        assert_eq!(
            eval_record("COUNTBLANK({Name}, {Qty}, {Missing})", &record),
            Ok(Value::Number(2.0))
        );
        assert_eq!(eval("COUNT()"), Ok(Value::Number(0.0)));
    }

    #[test]
    fn test_type_checks() {
        assert_eq!(eval("ISBLANK(BLANK())"), Ok(Value::Boolean(true)));
        assert_eq!(eval("ISBLANK(\"\")"), Ok(Value::Boolean(true)));
        assert_eq!(eval("ISBLANK(0)"), Ok(Value::Boolean(false)));
        assert_eq!(eval("ISNUMBER(1.5)"), Ok(Value::Boolean(true)));
        assert_eq!(eval("ISNUMBER(\"1.5\")"), Ok(Value::Boolean(false)));
        assert_eq!(eval("ISNUMBER(AVG())"), Ok(Value::Boolean(false)));
        assert_eq!(eval("ISTEXT(\"x\")"), Ok(Value::Boolean(true)));
        assert_eq!(eval("ISTEXT(TRUE)"), Ok(Value::Boolean(false)));
    }

    #[test]
    fn test_iserror() {
        assert_eq!(eval("ISERROR(SQRT(-1))"), Ok(Value::Boolean(true)));
        assert_eq!(eval("ISERROR(AVG())"), Ok(Value::Boolean(true)));
        assert_eq!(eval("ISERROR(42)"), Ok(Value::Boolean(false)));
        assert_eq!(eval("ISERROR(\"#ERROR!\")"), Ok(Value::Boolean(false)));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(eval("VALUE(\"12.5 units\")"), Ok(Value::Number(12.5)));
        assert_eq!(eval("VALUE(\"none\")"), Ok(Value::Number(0.0)));
        assert_eq!(eval("TEXT(3.14159, 2)"), Ok(Value::string("3.14")));
        assert_eq!(eval("TEXT(42)"), Ok(Value::string("42")));
        assert_eq!(eval("TEXT(\"abc\", 2)"), Ok(Value::string("abc")));
        assert_eq!(eval("TEXT(FALSE)"), Ok(Value::string("FALSE")));
        assert_eq!(eval("BLANK()"), Ok(Value::Empty));
    }

    #[test]
    fn test_text_clamps_huge_decimals() {
        let Ok(Value::String(text)) = eval("TEXT(1.5, 100000)") else {
            panic!("TEXT should produce a string");
        };
        assert!(text.starts_with("1.50"));
        assert_eq!(text.len(), 2 + MAX_DECIMALS as usize);
    }
}
