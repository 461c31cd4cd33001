//! Aggregate functions

use crate::ast::Expr;
use crate::evaluator::Frame;
use crate::value::{EvalError, Value};

/// Evaluate every argument as a number, stopping at the first failure
fn numbers(args: &[Expr], frame: &Frame<'_>) -> Result<Vec<f64>, EvalError> {
    args.iter().map(|arg| frame.eval_number(arg)).collect()
}

/// SUM function
pub fn fn_sum(args: &[Expr], frame: &Frame<'_>) -> Value {
    match numbers(args, frame) {
        Ok(values) => frame.number_result(values.iter().sum()),
        Err(e) => Value::Error(e),
    }
}

/// AVG function
///
/// Non-numeric arguments add nothing to the sum but still count towards the
/// divisor.
pub fn fn_avg(args: &[Expr], frame: &Frame<'_>) -> Value {
    let sum: f64 = args
        .iter()
        .filter_map(|arg| frame.eval(arg).as_number())
        .sum();
    frame.number_result(sum / args.len() as f64)
}

/// COUNT function: arguments that evaluate without error
pub fn fn_count(args: &[Expr], frame: &Frame<'_>) -> Value {
    let count = args.iter().filter(|arg| !frame.eval(arg).is_error()).count();
    Value::Number(count as f64)
}

/// MIN function
pub fn fn_min(args: &[Expr], frame: &Frame<'_>) -> Value {
    match numbers(args, frame) {
        Ok(values) => frame.number_result(values.into_iter().fold(f64::INFINITY, f64::min)),
        Err(e) => Value::Error(e),
    }
}

/// MAX function
pub fn fn_max(args: &[Expr], frame: &Frame<'_>) -> Value {
    match numbers(args, frame) {
        Ok(values) => frame.number_result(values.into_iter().fold(f64::NEG_INFINITY, f64::max)),
        Err(e) => Value::Error(e),
    }
}
