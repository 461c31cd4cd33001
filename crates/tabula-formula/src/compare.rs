//! Relational operators used by conditional functions
//!
//! Conditions compare numbers only:
//! - `if(A1<A2;then;else)` uses the branching form, [`CompareOp::select`]
//! - `countif(A1;A2;>4)` uses the boolean form, [`CompareOp::holds`]

use crate::error::{FormulaError, FormulaResult};
use std::fmt;

/// Tolerance for `=` and `<>` so that `0.1+0.2=0.3` holds
const EQUALITY_EPSILON: f64 = 1e-10;

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    NotEqual,
    Equal,
}

impl CompareOp {
    /// Parse an operator spelling: `<`, `<=`, `>`, `>=`, `<>` or `=`
    pub fn parse(s: &str) -> FormulaResult<Self> {
        match s {
            "<" => Ok(CompareOp::Less),
            "<=" => Ok(CompareOp::LessEqual),
            ">" => Ok(CompareOp::Greater),
            ">=" => Ok(CompareOp::GreaterEqual),
            "<>" => Ok(CompareOp::NotEqual),
            "=" => Ok(CompareOp::Equal),
            _ => Err(FormulaError::InvalidOperator(s.to_string())),
        }
    }

    /// The operator's spelling
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Less => "<",
            CompareOp::LessEqual => "<=",
            CompareOp::Greater => ">",
            CompareOp::GreaterEqual => ">=",
            CompareOp::NotEqual => "<>",
            CompareOp::Equal => "=",
        }
    }

    /// Whether `left op right` holds
    pub fn holds(&self, left: f64, right: f64) -> bool {
        let equal = (left - right).abs() < EQUALITY_EPSILON;
        match self {
            CompareOp::Less => left < right && !equal,
            CompareOp::LessEqual => left < right || equal,
            CompareOp::Greater => left > right && !equal,
            CompareOp::GreaterEqual => left > right || equal,
            CompareOp::NotEqual => !equal,
            CompareOp::Equal => equal,
        }
    }

    /// Pick `then` if `left op right` holds, otherwise `otherwise`
    pub fn select<T>(&self, left: f64, right: f64, then: T, otherwise: T) -> T {
        if self.holds(left, right) {
            then
        } else {
            otherwise
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
