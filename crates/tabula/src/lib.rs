//! # tabula
//!
//! A spreadsheet formula engine.
//!
//! Cells of a bounded grid hold plain text or formula text starting with `=`.
//! Formulas support arithmetic, references to other cells, references to
//! cells of other tables (resolved through a [`LinkResolver`]), and the
//! functions `sum`, `avg`, `count`, `min`, `max`, `if` and `countif`.
//!
//! ## Features
//!
//! - Recursive-descent formula parser with operator precedence
//! - Circular reference detection
//! - Memoized values with dependency-driven invalidation
//! - Batched cross-table lookups
//! - A textual compatibility pipeline (precedence normalisation followed by
//!   left-to-right reduction)
//!
//! ## Example
//!
//! ```rust
//! use tabula::prelude::*;
//!
//! let mut sheet = Sheet::new(10, 3).unwrap();
//! sheet.set("A1", "5").unwrap();
//! sheet.set("A2", "10").unwrap();
//! sheet.set("B1", "=if(A1<A2;\"yes\";\"no\")").unwrap();
//! sheet.set("B2", "=avg(A1;A2;A3)").unwrap();
//!
//! assert_eq!(sheet.display("B1").unwrap(), "yes");
//! assert_eq!(sheet.display("B2").unwrap(), "5");
//! ```

pub mod calculation;
pub mod prelude;
pub mod sheet;

pub use calculation::{CalculationCache, CalculationStats};
pub use sheet::Sheet;

// Re-export core types
pub use tabula_core::{
    is_formula, CellId, Error, Grid, GridAccess, Result, TableRef, FORMULA_MARKER, MAX_COLS,
    SENTINEL,
};

// Re-export formula types
pub use tabula_formula::{
    parse_expression, parse_formula, textual, CollectingSink, CompareOp, DiagnosticSink,
    EngineOptions, ErrorKind, EvalError, EvaluationContext, Expr, FormulaError, LinkResolver,
    NoLinks, StaticLinks, Syntax, TracingSink, Value,
};
