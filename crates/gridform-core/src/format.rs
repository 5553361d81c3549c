//! Display formats for computed values

use crate::error::{Error, Result};
use crate::value::Value;
use std::fmt;
use std::str::FromStr;

/// How a formula field's value is rendered for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum DisplayFormat {
    /// Fixed decimals (`1234.50`)
    #[default]
    Number,
    /// Dollar amount with thousands separators (`$1,234.50`)
    Currency,
    /// Value × 100 with a percent sign (`12.50%`)
    Percentage,
    /// `YYYY-MM-DD`
    Date,
    /// `YYYY-MM-DD HH:MM:SS`, UTC
    Datetime,
    /// Plain text form
    Text,
}

impl DisplayFormat {
    /// Format name as used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayFormat::Number => "number",
            DisplayFormat::Currency => "currency",
            DisplayFormat::Percentage => "percentage",
            DisplayFormat::Date => "date",
            DisplayFormat::Datetime => "datetime",
            DisplayFormat::Text => "text",
        }
    }
}

impl fmt::Display for DisplayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "number" => Ok(DisplayFormat::Number),
            "currency" => Ok(DisplayFormat::Currency),
            "percentage" | "percent" => Ok(DisplayFormat::Percentage),
            "date" => Ok(DisplayFormat::Date),
            "datetime" => Ok(DisplayFormat::Datetime),
            "text" => Ok(DisplayFormat::Text),
            _ => Err(Error::InvalidDisplayFormat(s.to_string())),
        }
    }
}

/// Largest number of decimal places rendered; larger requests are clamped to it
pub const MAX_DECIMALS: u32 = 100;

/// Render `value` for display.
///
/// Values that do not fit the format (text under `number`, a number under `text`...) fall
/// back to their plain text form. Empty values always render as an empty string.
/// `decimals` is clamped to [`MAX_DECIMALS`].
pub fn format_value(value: &Value, format: DisplayFormat, decimals: u32) -> String {
    let decimals = decimals.min(MAX_DECIMALS) as usize;

    match (format, value) {
        (_, Value::Empty) => String::new(),
        (DisplayFormat::Number, Value::Number(n)) if n.is_finite() => {
            format!("{:.*}", decimals, n)
        }
        (DisplayFormat::Currency, Value::Number(n)) if n.is_finite() => {
            let sign = if *n < 0.0 { "-" } else { "" };
            format!("{}${}", sign, group_thousands(&format!("{:.*}", decimals, n.abs())))
        }
        (DisplayFormat::Percentage, Value::Number(n)) if n.is_finite() => {
            format!("{:.*}%", decimals, n * 100.0)
        }
        (DisplayFormat::Date, v) | (DisplayFormat::Datetime, v) => match v.to_date() {
            Some(d) if format == DisplayFormat::Date => d.format("%Y-%m-%d").to_string(),
            Some(d) => d.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => v.to_text(),
        },
        (_, v) => v.to_text(),
    }
}

/// Insert `,` every three digits of the integer part of a plain decimal string
fn group_thousands(digits: &str) -> String {
    let (int_part, frac_part) = match digits.find('.') {
        Some(pos) => digits.split_at(pos),
        None => (digits, ""),
    };

    let mut grouped = String::with_capacity(digits.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped.push_str(frac_part);
    grouped
}
