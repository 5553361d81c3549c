//! Date and time functions
//!
//! All dates are UTC. Arguments are coerced with [`Value::to_date`]; an argument that is not
//! a date yields an empty result rather than an error.

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::EvaluationContext;
use chrono::{DateTime, Datelike, Duration, Months, TimeZone, Timelike, Utc};
use gridform_core::Value;
use std::str::FromStr;

/// Largest offset DATEADD applies, in milliseconds (roughly 30,000 years)
const MAX_OFFSET_MS: f64 = 1e15;

/// Unit for DATEDIFF / DATEADD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl DateUnit {
    /// Length in milliseconds for the fixed-size units
    fn fixed_millis(self) -> Option<i64> {
        match self {
            DateUnit::Milliseconds => Some(1),
            DateUnit::Seconds => Some(1_000),
            DateUnit::Minutes => Some(60_000),
            DateUnit::Hours => Some(3_600_000),
            DateUnit::Days => Some(86_400_000),
            DateUnit::Weeks => Some(604_800_000),
            DateUnit::Months | DateUnit::Years => None,
        }
    }
}

impl FromStr for DateUnit {
    type Err = FormulaError;

    fn from_str(s: &str) -> FormulaResult<Self> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "milliseconds" | "millisecond" | "ms" => DateUnit::Milliseconds,
            "seconds" | "second" => DateUnit::Seconds,
            "minutes" | "minute" => DateUnit::Minutes,
            "hours" | "hour" => DateUnit::Hours,
            "days" | "day" => DateUnit::Days,
            "weeks" | "week" => DateUnit::Weeks,
            "months" | "month" => DateUnit::Months,
            "years" | "year" => DateUnit::Years,
            _ => {
                return Err(FormulaError::InvalidArgument(format!(
                    "unknown date unit '{}'",
                    s
                )))
            }
        })
    }
}

fn unit_arg(args: &[Value], index: usize) -> FormulaResult<DateUnit> {
    match args.get(index) {
        Some(v) if !v.is_blank() => v.to_text().parse(),
        _ => Ok(DateUnit::Days),
    }
}

fn component<N: Into<i64>>(
    args: &[Value],
    f: impl Fn(&DateTime<Utc>) -> N,
) -> FormulaResult<Value> {
    Ok(args[0]
        .to_date()
        .map(|d| Value::Number(f(&d).into() as f64))
        .unwrap_or(Value::Empty))
}

/// TODAY(): the evaluation time truncated to midnight UTC
pub fn fn_today(_args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    let now = ctx.now();
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(now);
    Ok(Value::Date(midnight))
}

/// NOW()
pub fn fn_now(_args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Date(ctx.now()))
}

/// YEAR(date)
pub fn fn_year(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    component(args, |d| d.year())
}

/// MONTH(date), 1-12
pub fn fn_month(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    component(args, |d| d.month())
}

/// DAY(date), 1-31
pub fn fn_day(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    component(args, |d| d.day())
}

/// HOUR(date)
pub fn fn_hour(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    component(args, |d| d.hour())
}

/// MINUTE(date)
pub fn fn_minute(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    component(args, |d| d.minute())
}

/// SECOND(date)
pub fn fn_second(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    component(args, |d| d.second())
}

/// DATEDIFF(start, end, [unit])
///
/// `end - start` in whole units, truncated toward zero. Months and years count calendar
/// boundaries crossed and ignore the day of month.
pub fn fn_datediff(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let unit = unit_arg(args, 2)?;
    let (start, end) = match (args[0].to_date(), args[1].to_date()) {
        (Some(start), Some(end)) => (start, end),
        _ => return Ok(Value::Empty),
    };

    let diff = match unit.fixed_millis() {
        Some(size) => (end.timestamp_millis() - start.timestamp_millis()) / size,
        None => {
            let years = (end.year() - start.year()) as i64;
            if unit == DateUnit::Years {
                years
            } else {
                years * 12 + end.month() as i64 - start.month() as i64
            }
        }
    };
    Ok(Value::Number(diff as f64))
}

/// DATEADD(date, amount, [unit])
///
/// Month and year arithmetic keeps the day of month, clamped to the length of the target
/// month (Jan 31 + 1 month = Feb 29 in a leap year). Results outside the representable range
/// are empty.
pub fn fn_dateadd(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let unit = unit_arg(args, 2)?;
    let date = match args[0].to_date() {
        Some(d) => d,
        None => return Ok(Value::Empty),
    };
    let amount = args[1].to_number();
    if !amount.is_finite() {
        return Ok(Value::Empty);
    }

    let shifted = match unit.fixed_millis() {
        Some(size) => {
            let ms = (amount * size as f64).round();
            if ms.abs() > MAX_OFFSET_MS {
                None
            } else {
                date.checked_add_signed(Duration::milliseconds(ms as i64))
            }
        }
        None => {
            let months = amount.trunc() * if unit == DateUnit::Years { 12.0 } else { 1.0 };
            if months.abs() > u32::MAX as f64 {
                None
            } else if months >= 0.0 {
                date.checked_add_months(Months::new(months as u32))
            } else {
                date.checked_sub_months(Months::new((-months) as u32))
            }
        }
    };
    Ok(shifted.map(Value::Date).unwrap_or(Value::Empty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{eval, eval_at};
    use pretty_assertions::assert_eq;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 14, 45, 30).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> Value {
        Value::Date(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_now_and_today() {
        assert_eq!(eval_at("NOW()", fixed_now()), Ok(Value::Date(fixed_now())));
        assert_eq!(eval_at("TODAY()", fixed_now()), Ok(date(2024, 3, 15)));
    }

    #[test]
    fn test_components() {
        assert_eq!(eval_at("YEAR(NOW())", fixed_now()), Ok(Value::Number(2024.0)));
        assert_eq!(eval_at("MONTH(NOW())", fixed_now()), Ok(Value::Number(3.0)));
        assert_eq!(eval_at("DAY(NOW())", fixed_now()), Ok(Value::Number(15.0)));
        assert_eq!(eval_at("HOUR(NOW())", fixed_now()), Ok(Value::Number(14.0)));
        assert_eq!(eval_at("MINUTE(NOW())", fixed_now()), Ok(Value::Number(45.0)));
        assert_eq!(eval_at("SECOND(NOW())", fixed_now()), Ok(Value::Number(30.0)));
        assert_eq!(eval("YEAR(\"2021-07-04\")"), Ok(Value::Number(2021.0)));
        assert_eq!(eval("YEAR(\"not a date\")"), Ok(Value::Empty));
        assert_eq!(eval("DAY({Missing})"), Ok(Value::Empty));
    }

    #[test]
    fn test_datediff_fixed_units() {
        assert_eq!(
            eval("DATEDIFF(\"2024-01-01\", \"2024-01-31\")"),
            Ok(Value::Number(30.0))
        );
        assert_eq!(
            eval("DATEDIFF(\"2024-01-31\", \"2024-01-01\", \"days\")"),
            Ok(Value::Number(-30.0))
        );
        assert_eq!(
            eval("DATEDIFF(\"2024-01-01\", \"2024-01-02 12:00\", \"hours\")"),
            Ok(Value::Number(36.0))
        );
        // Truncated toward zero
        assert_eq!(
            eval("DATEDIFF(\"2024-01-01\", \"2024-01-20\", \"week\")"),
            Ok(Value::Number(2.0))
        );
    }

    #[test]
    fn test_datediff_calendar_units() {
        assert_eq!(
            eval("DATEDIFF(\"2023-11-30\", \"2024-02-01\", \"months\")"),
            Ok(Value::Number(3.0))
        );
        assert_eq!(
            eval("DATEDIFF(\"2020-06-01\", \"2024-01-01\", \"years\")"),
            Ok(Value::Number(4.0))
        );
    }

    #[test]
    fn test_datediff_invalid() {
        assert_eq!(eval("DATEDIFF(\"x\", \"2024-01-01\")"), Ok(Value::Empty));
        assert!(matches!(
            eval("DATEDIFF(\"2024-01-01\", \"2024-01-02\", \"fortnights\")"),
            Err(FormulaError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_dateadd() {
        assert_eq!(eval("DATEADD(\"2024-01-01\", 10)"), Ok(date(2024, 1, 11)));
        assert_eq!(eval("DATEADD(\"2024-01-01\", -1, \"days\")"), Ok(date(2023, 12, 31)));
        assert_eq!(eval("DATEADD(\"2024-01-01\", 2, \"weeks\")"), Ok(date(2024, 1, 15)));
        assert_eq!(eval("DATEADD(\"2024-01-31\", 1, \"month\")"), Ok(date(2024, 2, 29)));
        assert_eq!(eval("DATEADD(\"2024-03-31\", -1, \"months\")"), Ok(date(2024, 2, 29)));
        assert_eq!(eval("DATEADD(\"2024-02-29\", 1, \"years\")"), Ok(date(2025, 2, 28)));
        assert_eq!(
            eval("DATEADD(\"2024-01-01\", 90, \"minutes\")"),
            Ok(Value::Date(Utc.with_ymd_and_hms(2024, 1, 1, 1, 30, 0).unwrap()))
        );
    }

    #[test]
    fn test_dateadd_out_of_range() {
        assert_eq!(eval("DATEADD(\"2024-01-01\", POWER(10, 20), \"days\")"), Ok(Value::Empty));
        assert_eq!(eval("DATEADD(\"2024-01-01\", POWER(10, 12), \"years\")"), Ok(Value::Empty));
        assert_eq!(eval("DATEADD(\"soon\", 1)"), Ok(Value::Empty));
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("Days".parse::<DateUnit>(), Ok(DateUnit::Days));
        assert_eq!(" ms ".parse::<DateUnit>(), Ok(DateUnit::Milliseconds));
        assert!("decades".parse::<DateUnit>().is_err());
    }
}
