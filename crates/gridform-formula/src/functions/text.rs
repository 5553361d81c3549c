//! Text functions
//!
//! Offsets and lengths count characters, not bytes, and start at 0.

use super::to_count;
use crate::error::FormulaResult;
use crate::evaluator::EvaluationContext;
use gridform_core::Value;
use regex::{NoExpand, Regex};

fn take_left(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn take_right(s: &str, n: usize) -> String {
    let len = s.chars().count();
    if n >= len {
        return s.to_string();
    }
    s.chars().skip(len - n).collect()
}

/// CONCAT(value, ...)
pub fn fn_concat(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::String(args.iter().map(Value::to_text).collect()))
}

/// UPPER(text)
pub fn fn_upper(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::String(args[0].to_text().to_uppercase()))
}

/// LOWER(text)
pub fn fn_lower(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::String(args[0].to_text().to_lowercase()))
}

/// TRIM(text)
pub fn fn_trim(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::String(args[0].to_text().trim().to_string()))
}

/// LEN(text)
pub fn fn_len(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Number(args[0].to_text().chars().count() as f64))
}

/// LEFT(text, [count])
pub fn fn_left(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let count = args.get(1).map(to_count).unwrap_or(1);
    Ok(Value::String(take_left(&args[0].to_text(), count)))
}

/// RIGHT(text, [count])
pub fn fn_right(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let count = args.get(1).map(to_count).unwrap_or(1);
    Ok(Value::String(take_right(&args[0].to_text(), count)))
}

/// MID(text, start, [count]); `start` is 0-based, `count` defaults to the rest of the text
pub fn fn_mid(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let text = args[0].to_text();
    let start = to_count(&args[1]);
    let count = args.get(2).map(to_count).unwrap_or(usize::MAX);
    Ok(Value::String(text.chars().skip(start).take(count).collect()))
}

/// FIND(search, text, [start])
///
/// 0-based character position of the first match at or after `start`, or empty when the
/// text does not contain `search`.
pub fn fn_find(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let needle = args[0].to_text();
    let haystack = args[1].to_text();
    let start = args.get(2).map(to_count).unwrap_or(0);

    let start_byte = match haystack.char_indices().nth(start) {
        Some((i, _)) => i,
        None if start == haystack.chars().count() => haystack.len(),
        None => return Ok(Value::Empty),
    };

    Ok(match haystack[start_byte..].find(&needle) {
        Some(offset) => {
            let position = haystack[..start_byte + offset].chars().count();
            Value::Number(position as f64)
        }
        None => Value::Empty,
    })
}

/// REPLACE(text, pattern, replacement)
///
/// `pattern` is a regular expression replaced at every match; a pattern that is not a valid
/// regex is matched literally. The replacement is inserted as-is.
pub fn fn_replace(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let text = args[0].to_text();
    let pattern = args[1].to_text();
    let replacement = args[2].to_text();

    if pattern.is_empty() {
        return Ok(Value::String(text));
    }

    let replaced = match Regex::new(&pattern) {
        Ok(re) => re
            .replace_all(&text, NoExpand(replacement.as_str()))
            .into_owned(),
        Err(_) => text.replace(&pattern, &replacement),
    };
    Ok(Value::String(replaced))
}
