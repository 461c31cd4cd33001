//! Formula error types

use crate::value::{ErrorKind, EvalError};
use thiserror::Error;

/// Result type for formula parsing
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while turning formula text into an AST
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("invalid formula: {0}")]
    Syntax(String),

    /// Malformed numeric literal
    #[error("invalid number: '{0}'")]
    InvalidNumber(String),

    /// Comparison operator outside the supported set
    #[error("invalid operator: '{0}'")]
    InvalidOperator(String),
}

impl FormulaError {
    /// The evaluation error kind this parse failure surfaces as
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormulaError::Syntax(_) | FormulaError::InvalidOperator(_) => ErrorKind::InvalidSyntax,
            FormulaError::InvalidNumber(_) => ErrorKind::InvalidNumber,
        }
    }
}

impl From<FormulaError> for EvalError {
    fn from(e: FormulaError) -> Self {
        EvalError::new(e.kind(), e.to_string())
    }
}
