//! Formula evaluator
//!
//! Evaluates formula text against a grid. Every formula reduces to one
//! [`Value`]; failures become [`Value::Error`] and are reported once to the
//! [`DiagnosticSink`] where they originate.

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::functions;
use crate::link::{LinkResolver, NoLinks};
use crate::options::{EngineOptions, Syntax};
use crate::parser::{parse_expression, parse_formula, MAX_NESTING};
use crate::textual;
use crate::value::{ErrorKind, EvalError, Value};
use ahash::AHashSet;
use std::cell::RefCell;
use std::collections::HashMap;
use tabula_core::{is_formula, CellId, GridAccess, TableRef, FORMULA_MARKER, SENTINEL};
use tracing::debug;

/// Memo of formula cell values, consulted before a formula cell is evaluated
pub trait ValueCache {
    /// Previously stored value of `cell`
    fn lookup(&self, cell: CellId) -> Option<Value>;

    /// Store the value of a freshly evaluated formula cell
    ///
    /// `reads` lists the local cells the formula read. `volatile` is set when
    /// the value depends on something other than those cells (a cross-table
    /// lookup or a cycle) and must not be reused.
    fn store(&self, cell: CellId, value: &Value, reads: &[CellId], volatile: bool);
}

/// Cells read by one formula cell under evaluation
#[derive(Debug, Default)]
struct Reads {
    cells: Vec<CellId>,
    volatile: bool,
}

#[derive(Debug, Default)]
struct EvalState {
    /// Formula cells currently under evaluation
    visiting: AHashSet<CellId>,
    /// One entry per formula cell on the evaluation stack
    frames: Vec<Reads>,
}

/// Context for formula evaluation
///
/// Holds the grid and external collaborators; evaluation only needs `&self`.
pub struct EvaluationContext<'a> {
    grid: &'a dyn GridAccess,
    links: &'a dyn LinkResolver,
    diagnostics: &'a dyn DiagnosticSink,
    cache: Option<&'a dyn ValueCache>,
    options: EngineOptions,
    state: RefCell<EvalState>,
}

impl<'a> EvaluationContext<'a> {
    /// Context over `grid` with no links, tracing diagnostics and default options
    pub fn new(grid: &'a dyn GridAccess) -> Self {
        Self {
            grid,
            links: &NoLinks,
            diagnostics: &TracingSink,
            cache: None,
            options: EngineOptions::default(),
            state: RefCell::new(EvalState::default()),
        }
    }

    pub fn with_links(mut self, links: &'a dyn LinkResolver) -> Self {
        self.links = links;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: &'a dyn DiagnosticSink) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Memoize formula cells in `cache`; ignored when `options.cache` is off
    pub fn with_cache(mut self, cache: &'a dyn ValueCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    // === Entry points ===

    /// The text shown for `content`
    ///
    /// Plain text and invalid formulas are shown verbatim; valid formulas show
    /// their value, or `#####` if evaluation failed.
    pub fn display(&self, content: &str) -> String {
        if !textual::is_valid(content) {
            return content.to_string();
        }
        self.evaluate(content).to_display()
    }

    /// Value of arbitrary cell content that is not stored in the grid
    pub fn evaluate(&self, content: &str) -> Value {
        if !is_formula(content) {
            return Value::from_literal(content);
        }
        if !textual::is_valid(content) {
            return Value::Text(content.to_string());
        }
        self.evaluate_formula(content)
    }

    /// Value of the cell at `id`
    pub fn evaluate_cell(&self, id: CellId) -> Value {
        if !self.grid.in_bounds(id.row, id.col) {
            return self.fail(
                ErrorKind::InvalidReference,
                format!("invalid reference: {} is outside the grid", id),
            );
        }
        let content = self.grid.content_at(id.row, id.col);
        if textual::is_valid(content) {
            self.formula_cell(id, content)
        } else {
            self.evaluate(content)
        }
    }

    /// The text shown for the cell at `id`
    pub fn display_cell(&self, id: CellId) -> String {
        if !self.grid.in_bounds(id.row, id.col) {
            return self.evaluate_cell(id).to_display();
        }
        let content = self.grid.content_at(id.row, id.col);
        if textual::is_valid(content) {
            self.formula_cell(id, content).to_display()
        } else {
            content.to_string()
        }
    }

    // === Cell resolution ===

    /// Value of a cell referenced from a formula
    fn reference(&self, id: CellId) -> Value {
        if !self.grid.in_bounds(id.row, id.col) {
            return self.fail(
                ErrorKind::InvalidReference,
                format!("invalid reference: {} is outside the grid", id),
            );
        }
        self.record_read(id);

        let content = self.grid.content_at(id.row, id.col);
        if content.is_empty() {
            return self.fail(
                ErrorKind::InvalidReference,
                format!("invalid reference: {} is empty", id),
            );
        }
        if content == SENTINEL {
            return self.fail(
                ErrorKind::InvalidReference,
                format!("invalid cell data: {}", id),
            );
        }
        if !is_formula(content) {
            return Value::from_literal(content);
        }

        let value = self.evaluate_cell(id);
        if value.is_error() {
            self.report(ErrorKind::InvalidReference, format!("invalid cell data: {}", id));
        }
        value
    }

    /// Evaluate a formula stored at `id`, with cycle detection and caching
    fn formula_cell(&self, id: CellId, content: &str) -> Value {
        let cache = self.cache.filter(|_| self.options.cache);
        if let Some(value) = cache.and_then(|c| c.lookup(id)) {
            debug!(cell = %id, "cache hit");
            return value;
        }

        {
            let mut state = self.state.borrow_mut();
            if state.visiting.contains(&id) || state.visiting.len() >= self.options.max_depth {
                let message = if state.visiting.contains(&id) {
                    format!("circular reference: {}", id)
                } else {
                    format!("circular reference: reference chain too deep at {}", id)
                };
                // Values computed inside a cycle depend on where evaluation entered it
                for frame in state.frames.iter_mut() {
                    frame.volatile = true;
                }
                drop(state);
                return self.fail(ErrorKind::CircularReference, message);
            }
            state.visiting.insert(id);
            state.frames.push(Reads::default());
        }

        debug!(cell = %id, formula = content, "evaluating cell");
        let value = self.evaluate_formula(content);

        let reads = {
            let mut state = self.state.borrow_mut();
            state.visiting.remove(&id);
            let reads = state.frames.pop().unwrap_or_default();
            if reads.volatile {
                if let Some(parent) = state.frames.last_mut() {
                    parent.volatile = true;
                }
            }
            reads
        };

        if let Some(cache) = cache {
            cache.store(id, &value, &reads.cells, reads.volatile);
        }
        value
    }

    fn record_read(&self, id: CellId) {
        if let Some(frame) = self.state.borrow_mut().frames.last_mut() {
            frame.cells.push(id);
        }
    }

    fn mark_volatile(&self) {
        if let Some(frame) = self.state.borrow_mut().frames.last_mut() {
            frame.volatile = true;
        }
    }

    // === Pipelines ===

    fn evaluate_formula(&self, content: &str) -> Value {
        match self.options.syntax {
            Syntax::Grammar => match parse_formula(content) {
                Ok(expr) => self.frame_for(&expr).eval(&expr),
                Err(e) => self.fail(e.kind(), e.to_string()),
            },
            Syntax::Textual => self.evaluate_textual(content),
        }
    }

    /// Precedence normalisation and left-to-right reduction; each operand
    /// token is parsed on its own
    fn evaluate_textual(&self, content: &str) -> Value {
        let body = content.strip_prefix(FORMULA_MARKER).unwrap_or(content);
        if textual::nesting_depth(body) > MAX_NESTING {
            return self.fail(
                ErrorKind::InvalidSyntax,
                "invalid formula: formula nested too deeply",
            );
        }
        let normalized = textual::normalize_precedence(body);
        textual::reduce_left_to_right(
            &normalized,
            &mut |token: &str| self.textual_operand(token),
            &mut |op: char, left: Value, right: Value| match BinaryOperator::from_char(op) {
                Some(op) => self.arithmetic(op, left, right),
                None => self.fail(
                    ErrorKind::InvalidSyntax,
                    format!("invalid formula: unknown operator '{}'", op),
                ),
            },
        )
    }

    fn textual_operand(&self, token: &str) -> Value {
        let source = textual::restore_operand(token);
        if source.trim().is_empty() {
            return self.fail(ErrorKind::InvalidSyntax, "invalid formula: missing operand");
        }
        match parse_expression(&source) {
            Ok(expr) => self.frame_for(&expr).eval(&expr),
            Err(e) => self.fail(e.kind(), e.to_string()),
        }
    }

    /// Resolve every table reference in `expr` with a single batch lookup
    fn frame_for(&self, expr: &Expr) -> Frame<'_> {
        let refs = expr.table_refs();
        let links = if refs.is_empty() {
            HashMap::new()
        } else {
            self.mark_volatile();
            debug!(count = refs.len(), "resolving table references");
            self.links.resolve(&refs)
        };
        Frame { ctx: self, links }
    }

    // === Arithmetic ===

    fn arithmetic(&self, op: BinaryOperator, left: Value, right: Value) -> Value {
        if left.is_error() {
            return left;
        }
        if right.is_error() {
            return right;
        }
        let a = match self.number(&left) {
            Ok(n) => n,
            Err(e) => return Value::Error(e),
        };
        let b = match self.number(&right) {
            Ok(n) => n,
            Err(e) => return Value::Error(e),
        };

        let result = match op {
            BinaryOperator::Add => a + b,
            BinaryOperator::Subtract => a - b,
            BinaryOperator::Multiply => a * b,
            BinaryOperator::Divide => {
                if b == 0.0 {
                    return self.fail(ErrorKind::DivisionByZero, "division by zero");
                }
                a / b
            }
        };

        self.finite(result)
    }

    /// A computed number, or `InvalidNumber` once it overflows
    fn finite(&self, result: f64) -> Value {
        if result.is_finite() {
            Value::Number(result)
        } else {
            self.fail(ErrorKind::InvalidNumber, "invalid number: result out of range")
        }
    }

    /// Coerce a non-error value to a number
    fn number(&self, value: &Value) -> Result<f64, EvalError> {
        match value {
            Value::Error(e) => Err(e.clone()),
            other => other.as_number().ok_or_else(|| {
                self.report(
                    ErrorKind::InvalidNumber,
                    format!("invalid number: '{}'", other.to_display()),
                )
            }),
        }
    }

    // === Diagnostics ===

    fn report(&self, kind: ErrorKind, message: impl Into<String>) -> EvalError {
        let error = EvalError::new(kind, message);
        self.diagnostics.on_invalid_formula(&error.message);
        error
    }

    fn fail(&self, kind: ErrorKind, message: impl Into<String>) -> Value {
        Value::Error(self.report(kind, message))
    }
}

/// Evaluation of one parsed expression
///
/// Carries the values of the expression's table references, resolved up
/// front. Built-in functions receive the frame to evaluate their arguments.
pub struct Frame<'a> {
    ctx: &'a EvaluationContext<'a>,
    links: HashMap<TableRef, String>,
}

impl<'a> Frame<'a> {
    /// Evaluate an expression
    pub fn eval(&self, expr: &Expr) -> Value {
        match expr {
            Expr::Number(n) => Value::Number(*n),
            Expr::Text(s) => Value::Text(s.clone()),
            Expr::CellRef(id) => self.ctx.reference(*id),
            Expr::TableRef(r) => self.lookup(r),

            Expr::Unary {
                op: UnaryOperator::Negate,
                operand,
            } => {
                let value = self.eval(operand);
                match self.ctx.number(&value) {
                    Ok(n) => Value::Number(-n),
                    Err(e) => Value::Error(e),
                }
            }

            Expr::Binary { op, left, right } => {
                let left = self.eval(left);
                if left.is_error() {
                    return left;
                }
                let right = self.eval(right);
                self.ctx.arithmetic(*op, left, right)
            }

            Expr::Call { name, args } => self.call(name, args),

            Expr::Compare { op, .. } | Expr::Criterion { op, .. } => self.fail(
                ErrorKind::InvalidSyntax,
                format!("invalid formula: comparison '{}' outside a function condition", op),
            ),
        }
    }

    /// Evaluate an expression that must produce a number
    pub fn eval_number(&self, expr: &Expr) -> Result<f64, EvalError> {
        let value = self.eval(expr);
        self.ctx.number(&value)
    }

    /// Wrap a computed result; infinities and NaN become `InvalidNumber`
    pub fn number_result(&self, result: f64) -> Value {
        self.ctx.finite(result)
    }

    /// Report a failure and return it as a value
    pub fn fail(&self, kind: ErrorKind, message: impl Into<String>) -> Value {
        self.ctx.fail(kind, message)
    }

    fn lookup(&self, r: &TableRef) -> Value {
        match self.links.get(r) {
            Some(value) if value != SENTINEL => Value::from_literal(value),
            _ => self.fail(
                ErrorKind::ExternalLookupFailure,
                format!("external lookup failed: {}", r),
            ),
        }
    }

    fn call(&self, name: &str, args: &[Expr]) -> Value {
        let Some(def) = functions::registry().get(name) else {
            return self.fail(
                ErrorKind::InvalidFunction,
                format!("invalid formula: unknown function '{}'", name),
            );
        };
        if !def.accepts(args.len()) {
            return self.fail(
                ErrorKind::InvalidFunction,
                format!("invalid formula: {} expects {}", def.name, def.arity()),
            );
        }
        (def.implementation)(args, self)
    }
}
