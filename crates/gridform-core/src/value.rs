//! Scalar value types

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use lazy_regex::regex;
use std::fmt;

/// A scalar value read from a record or produced by a formula
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value (absent field, BLANK())
    #[default]
    Empty,

    /// Numeric value
    Number(f64),

    /// String value
    String(String),

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Point in time, always UTC
    Date(DateTime<Utc>),
}

impl Value {
    /// Create a new string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        Value::String(s.into())
    }

    /// Check if the value is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Empty, or an empty string
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Get the type name for messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Date(_) => "date",
        }
    }

    /// Numeric coercion used by arithmetic and ordering comparisons.
    ///
    /// Never fails: text without a leading number coerces to 0.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Date(d) => d.timestamp_millis() as f64,
            Value::String(s) => parse_leading_float(s).unwrap_or(0.0),
            Value::Empty => 0.0,
        }
    }

    /// Textual form used by `&`, CONCAT and the text functions
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Truthiness used by IF, AND, OR, NOT and `!`
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Empty => false,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Boolean(b) => *b,
            Value::Date(_) => true,
        }
    }

    /// Interpret the value as a point in time.
    ///
    /// Numbers are epoch milliseconds; strings are parsed with [`parse_date`].
    pub fn to_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Number(n) if n.is_finite() => Utc.timestamp_millis_opt(*n as i64).single(),
            Value::String(s) => parse_date(s),
            _ => None,
        }
    }
}

/// Parse the longest leading decimal number of `s`, ignoring leading whitespace.
fn parse_leading_float(s: &str) -> Option<f64> {
    let prefix = regex!(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").find(s.trim_start())?;
    prefix.as_str().parse().ok()
}

/// Parse a date or date-time string.
///
/// Accepts RFC 3339 and `YYYY-MM-DD` with an optional ` HH:MM[:SS[.fff]]` or
/// `THH:MM[:SS[.fff]]` time part; strings without an offset are taken as UTC.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Date(d) => write!(f, "{}", d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_number() {
        assert_eq!(Value::Number(2.5).to_number(), 2.5);
        assert_eq!(Value::Boolean(true).to_number(), 1.0);
        assert_eq!(Value::Boolean(false).to_number(), 0.0);
        assert_eq!(Value::Empty.to_number(), 0.0);
        assert_eq!(Value::string("42").to_number(), 42.0);
        assert_eq!(Value::string("  3.5kg").to_number(), 3.5);
        assert_eq!(Value::string("1e3").to_number(), 1000.0);
        assert_eq!(Value::string("-.5").to_number(), -0.5);
        assert_eq!(Value::string("abc").to_number(), 0.0);
        assert_eq!(Value::string("").to_number(), 0.0);
    }

    #[test]
    fn test_date_to_number_is_epoch_millis() {
        let d = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 1).unwrap();
        assert_eq!(Value::Date(d).to_number(), 1000.0);
    }

    #[test]
    fn test_to_text() {
        assert_eq!(Value::Number(500.0).to_text(), "500");
        assert_eq!(Value::Number(-0.0).to_text(), "0");
        assert_eq!(Value::Number(1.5).to_text(), "1.5");
        assert_eq!(Value::Number(f64::NAN).to_text(), "NaN");
        assert_eq!(Value::Number(f64::NEG_INFINITY).to_text(), "-Infinity");
        assert_eq!(Value::Boolean(true).to_text(), "TRUE");
        assert_eq!(Value::Empty.to_text(), "");
        let d = Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap();
        assert_eq!(Value::Date(d).to_text(), "2024-03-15T10:30:00.000Z");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Empty.is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::string("0").is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
    }

    #[test]
    fn test_strict_equality() {
        assert_eq!(Value::Number(1.0), Value::Number(1.0));
        assert_ne!(Value::Number(1.0), Value::string("1"));
        assert_ne!(Value::Boolean(true), Value::Number(1.0));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
    }

    #[test]
    fn test_parse_date() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2024-03-15"), Some(expected));

        let expected = Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap();
        assert_eq!(parse_date("2024-03-15T10:30:00Z"), Some(expected));
        assert_eq!(parse_date("2024-03-15 10:30"), Some(expected));
        assert_eq!(parse_date("2024-03-15T12:30:00+02:00"), Some(expected));

        assert_eq!(parse_date("next tuesday"), None);
    }

    #[test]
    fn test_to_date() {
        let d = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(Value::Number(d.timestamp_millis() as f64).to_date(), Some(d));
        assert_eq!(Value::string("2024-01-01").to_date(), Some(d));
        assert_eq!(Value::Boolean(true).to_date(), None);
        assert_eq!(Value::Empty.to_date(), None);
    }
}
