//! Evaluation values
//!
//! A formula reduces to exactly one [`Value`]. Failures are ordinary values
//! carrying an [`EvalError`]; they display as the fixed sentinel
//! [`SENTINEL`](tabula_core::SENTINEL) but keep their cause.

use std::fmt;
use tabula_core::SENTINEL;
use thiserror::Error;

/// Value types produced by evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Error(EvalError),
}

/// Category of an evaluation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// Unbalanced parentheses, malformed condition, unknown operator
    InvalidSyntax,
    /// Unparseable or malformed numeric literal, non-numeric operand
    InvalidNumber,
    /// Cell outside the grid or pointing at an empty cell
    InvalidReference,
    /// Unknown function name or wrong argument count
    InvalidFunction,
    /// Cross-table resolver denied or could not find a value
    ExternalLookupFailure,
    /// A cell was reached again while it was still being evaluated
    CircularReference,
    /// Division with a zero divisor
    DivisionByZero,
}

impl ErrorKind {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidSyntax => "invalid_syntax",
            ErrorKind::InvalidNumber => "invalid_number",
            ErrorKind::InvalidReference => "invalid_reference",
            ErrorKind::InvalidFunction => "invalid_function",
            ErrorKind::ExternalLookupFailure => "external_lookup_failure",
            ErrorKind::CircularReference => "circular_reference",
            ErrorKind::DivisionByZero => "division_by_zero",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An evaluation failure with its cause
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EvalError {
    pub kind: ErrorKind,
    pub message: String,
}

impl EvalError {
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl Value {
    /// Create an error value
    pub fn error<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Value::Error(EvalError::new(kind, message))
    }

    /// Interpret literal text the way plain cell content is read:
    /// a number if it parses as one, otherwise text.
    pub fn from_literal(text: &str) -> Self {
        match text.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            _ => Value::Text(text.to_string()),
        }
    }

    /// Convert to number, if possible
    ///
    /// Text is coerced when it parses as a finite number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Value::Error(_) => None,
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Get the error if this is one
    pub fn get_error(&self) -> Option<&EvalError> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }

    /// The text shown in a cell for this value
    pub fn to_display(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Error(_) => SENTINEL.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<EvalError> for Value {
    fn from(e: EvalError) -> Self {
        Value::Error(e)
    }
}

/// Format like a spreadsheet: no trailing zeros, integers without a fraction
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
