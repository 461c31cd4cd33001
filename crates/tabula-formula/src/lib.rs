//! # tabula-formula
//!
//! Formula parser and evaluator for tabula.
//!
//! This crate provides:
//! - Formula tokenizing and parsing (text → AST)
//! - Formula evaluation (AST → value) against a grid
//! - Built-in functions (`sum`, `avg`, `count`, `min`, `max`, `if`, `countif`)
//! - The textual compatibility pipeline (validator, operator locator,
//!   precedence normaliser, left-to-right reducer)
//! - Dependency tracking for cached recalculation
//!
//! ## Example
//!
//! ```rust
//! use tabula_core::Grid;
//! use tabula_formula::{EvaluationContext, Value};
//!
//! let mut grid = Grid::new(5, 5).unwrap();
//! grid.set("A1", "5").unwrap();
//! grid.set("A2", "10").unwrap();
//!
//! let ctx = EvaluationContext::new(&grid);
//! assert_eq!(ctx.evaluate("=A1+A2*2"), Value::Number(25.0));
//! assert_eq!(ctx.display("=sum(A1;A2)"), "15");
//! ```

pub mod ast;
pub mod compare;
pub mod dependency;
pub mod diagnostics;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod link;
pub mod options;
pub mod parser;
pub mod textual;
pub mod value;

pub use ast::{BinaryOperator, Expr, UnaryOperator};
pub use compare::CompareOp;
pub use dependency::DependencyGraph;
pub use diagnostics::{CollectingSink, DiagnosticSink, TracingSink};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{EvaluationContext, Frame, ValueCache};
pub use link::{LinkResolver, NoLinks, StaticLinks};
pub use options::{EngineOptions, Syntax};
pub use parser::{parse_expression, parse_formula};
pub use value::{ErrorKind, EvalError, Value};
