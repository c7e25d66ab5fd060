//! Scalar values and CGATS numeric coercion
//!
//! CGATS columns are contractually numeric except for the index-like
//! columns (`INDEX`, `SAMPLE_ID`, `SAMPLEID`), which may carry opaque
//! alphanumeric identifiers. Coercion happens at insert time, so a value
//! reaching the serializer is always one of integer, float or string.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

fn int_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+$").unwrap())
}

fn float_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").unwrap())
}

/// A scalar stored in a CGATS tree
#[derive(Debug, Clone)]
pub enum Value {
    /// Integer value
    Int(i64),
    /// Floating point value
    Real(f64),
    /// Opaque string value
    Text(String),
}

impl Value {
    /// True for `Int` and `Real`
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Real(_))
    }

    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            Value::Text(_) => None,
        }
    }

    /// String view of the value, if it is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// True for numeric values below zero
    pub fn is_negative(&self) -> bool {
        match self {
            Value::Int(i) => *i < 0,
            Value::Real(r) => *r < 0.0,
            Value::Text(_) => false,
        }
    }

    /// Count of decimal digits in the canonical rendering, ignoring sign
    /// and decimal point. Text values contribute no width.
    pub fn digit_width(&self) -> usize {
        match self {
            Value::Int(i) => i.unsigned_abs().to_string().len(),
            Value::Real(r) => format!("{r}").chars().filter(|c| c.is_ascii_digit()).count(),
            Value::Text(_) => 0,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Int(a), Value::Real(b)) | (Value::Real(b), Value::Int(a)) => *a as f64 == *b,
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// True for the column names exempt from the strictly-numeric rule
pub fn is_index_column(name: &str) -> bool {
    name.eq_ignore_ascii_case("INDEX")
        || name.eq_ignore_ascii_case("SAMPLE_ID")
        || name.eq_ignore_ascii_case("SAMPLEID")
}

/// Strip one pair of surrounding double quotes, if present
pub fn strip_quotes(token: &str) -> &str {
    token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token)
}

/// True if the token would parse as an integer or float
pub fn looks_numeric(token: &str) -> bool {
    !token.is_empty() && (int_re().is_match(token) || float_re().is_match(token))
}

/// Coerce a raw data-row token for the given column.
///
/// Index-like columns try integer, then float, and fall back to the
/// original string (opaque sample identifier). All other columns must
/// parse as a number.
pub fn coerce(column: &str, token: &str) -> Result<Value> {
    let token = strip_quotes(token);
    if is_index_column(column) {
        if int_re().is_match(token) {
            if let Ok(i) = token.parse::<i64>() {
                return Ok(Value::Int(i));
            }
        }
        if float_re().is_match(token) {
            if let Ok(r) = token.parse::<f64>() {
                return Ok(Value::Real(r));
            }
        }
        return Ok(Value::Text(token.to_string()));
    }
    if float_re().is_match(token) {
        if let Ok(r) = token.parse::<f64>() {
            return Ok(Value::Real(r));
        }
    }
    Err(Error::Value {
        column: column.to_string(),
        token: token.to_string(),
    })
}

/// Coerce a header or keyword token: integer, then float, else text
pub fn auto_coerce(token: &str) -> Value {
    let token = strip_quotes(token);
    if int_re().is_match(token) {
        if let Ok(i) = token.parse::<i64>() {
            return Value::Int(i);
        }
    }
    if float_re().is_match(token) {
        if let Ok(r) = token.parse::<f64>() {
            return Value::Real(r);
        }
    }
    Value::Text(token.to_string())
}

/// Format a float against the block-wide digit width.
///
/// The natural shortest rendering is kept when it fits; otherwise the
/// value is rounded to the fractional digits that fit, or to a bare
/// integer when the integer part alone exhausts the width.
fn format_number(v: f64, width: usize) -> String {
    let natural = format!("{v}");
    let digits = natural.chars().filter(|c| c.is_ascii_digit()).count();
    if digits <= width || !natural.contains('.') {
        return natural;
    }
    let int_digits = natural
        .split('.')
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_digit())
        .count();
    if int_digits >= width {
        format!("{v:.0}")
    } else {
        format!("{:.*}", width - int_digits, v)
    }
}

/// Render a sample value padded to the column width of its data block.
///
/// `width` is the block's maximum digit width; every value occupies
/// `width + 1` columns, one more for a negative sign. Non-numeric
/// identifiers are emitted quoted.
pub fn format_padded(value: &Value, width: usize) -> String {
    let column = width + 1 + usize::from(value.is_negative());
    let mut s = match value {
        Value::Int(i) => i.to_string(),
        Value::Real(r) => format_number(*r, width),
        Value::Text(t) => {
            if looks_numeric(t) {
                t.clone()
            } else {
                format!("\"{t}\"")
            }
        }
    };
    while s.len() < column {
        s.push(' ');
    }
    s
}
