//! Textual formula pipeline
//!
//! String-level helpers that work without a token stream:
//! - [`is_valid`] gates evaluation: invalid formula text is shown verbatim
//! - [`first_operator`] finds the first arithmetic operator outside parentheses
//! - [`normalize_precedence`] encodes `*`/`/` over `+`/`-` as extra nesting
//! - [`reduce_left_to_right`] folds a normalised expression strictly left to right
//!
//! Used together they evaluate arithmetic with correct precedence even though
//! the reducer itself knows nothing about precedence. The normaliser's output
//! is only ever evaluated, never stored.

use crate::parser::MAX_NESTING;
use crate::value::{ErrorKind, Value};
use tabula_core::FORMULA_MARKER;

/// Deepest group nesting the reducer descends into: normalisation turns each
/// `(` into three and wraps the whole body in two more
pub const MAX_GROUP_DEPTH: usize = 3 * MAX_NESTING + 2;

/// Check that formula text may be evaluated
///
/// False if `text` is empty, does not start with `=`, or has a different
/// number of `(` and `)`.
pub fn is_valid(text: &str) -> bool {
    if !text.starts_with(FORMULA_MARKER) {
        return false;
    }
    let open = text.matches('(').count();
    let close = text.matches(')').count();
    open == close
}

/// Byte index of the first `+ - * /` not enclosed in parentheses
///
/// On `(` the scan jumps to the matching `)`; operators inside are ignored.
pub fn first_operator(expr: &str) -> Option<usize> {
    let bytes = expr.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => match matching_paren(expr, i) {
                Some(close) => i = close,
                None => return None,
            },
            b'+' | b'-' | b'*' | b'/' => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Deepest parenthesis nesting in `expr`
pub fn nesting_depth(expr: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0;
    for b in expr.bytes() {
        match b {
            b'(' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

/// Byte index of the `)` matching the `(` at `open`
pub fn matching_paren(expr: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in expr.bytes().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Rewrite a formula body so that left-to-right splitting respects precedence
///
/// `+`→`))+((`, `-`→`))-((`, `*`→`)*(`, `/`→`)/(`, `(`→`(((`, `)`→`)))`,
/// everything wrapped in `((`…`))`. If the result does not validate, the body
/// is returned unchanged.
pub fn normalize_precedence(body: &str) -> String {
    let mut out = String::with_capacity(body.len() * 3 + 4);
    out.push_str("((");
    for c in body.chars() {
        match c {
            '+' => out.push_str("))+(("),
            '-' => out.push_str("))-(("),
            '*' => out.push_str(")*("),
            '/' => out.push_str(")/("),
            '(' => out.push_str("((("),
            ')' => out.push_str(")))"),
            _ => out.push(c),
        }
    }
    out.push_str("))");

    let mut check = String::with_capacity(out.len() + 1);
    check.push(FORMULA_MARKER);
    check.push_str(&out);
    if is_valid(&check) {
        out
    } else {
        body.to_string()
    }
}

/// Undo [`normalize_precedence`] on a fragment of normalised text
///
/// Operand fragments (function calls in particular) are handed to the
/// grammar parser in their original spelling.
pub fn restore_operand(fragment: &str) -> String {
    const PATTERNS: [(&str, char); 6] = [
        ("))+((", '+'),
        ("))-((", '-'),
        (")))", ')'),
        (")*(", '*'),
        (")/(", '/'),
        ("(((", '('),
    ];

    let mut out = String::with_capacity(fragment.len());
    let mut rest = fragment;
    'scan: while let Some(c) = rest.chars().next() {
        for (pattern, original) in PATTERNS {
            if let Some(tail) = rest.strip_prefix(pattern) {
                out.push(original);
                rest = tail;
                continue 'scan;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Evaluate an expression by strictly left-to-right chained reduction
///
/// The expression is split at its first top-level operator; the running
/// result is combined with each following operand in turn. Parenthesised
/// groups are reduced recursively; every other operand is passed to
/// `operand`. `combine` applies one arithmetic operator.
pub fn reduce_left_to_right<O, C>(expr: &str, operand: &mut O, combine: &mut C) -> Value
where
    O: FnMut(&str) -> Value,
    C: FnMut(char, Value, Value) -> Value,
{
    reduce_chain(expr, 0, operand, combine)
}

fn reduce_chain<O, C>(expr: &str, depth: usize, operand: &mut O, combine: &mut C) -> Value
where
    O: FnMut(&str) -> Value,
    C: FnMut(char, Value, Value) -> Value,
{
    let Some(first) = first_operator(expr) else {
        return reduce_operand(expr, depth, operand, combine);
    };

    let mut acc = reduce_operand(&expr[..first], depth, operand, combine);
    let mut rest = &expr[first..];
    loop {
        let op = rest.as_bytes()[0] as char;
        let tail = &rest[1..];
        match first_operator(tail) {
            Some(next) => {
                let rhs = reduce_operand(&tail[..next], depth, operand, combine);
                acc = combine(op, acc, rhs);
                rest = &tail[next..];
            }
            None => {
                let rhs = reduce_operand(tail, depth, operand, combine);
                return combine(op, acc, rhs);
            }
        }
    }
}

fn reduce_operand<O, C>(token: &str, depth: usize, operand: &mut O, combine: &mut C) -> Value
where
    O: FnMut(&str) -> Value,
    C: FnMut(char, Value, Value) -> Value,
{
    if token.starts_with('(') && matching_paren(token, 0) == Some(token.len() - 1) {
        if depth >= MAX_GROUP_DEPTH {
            return Value::error(
                ErrorKind::InvalidSyntax,
                "invalid formula: formula nested too deeply",
            );
        }
        return reduce_chain(&token[1..token.len() - 1], depth + 1, operand, combine);
    }
    operand(token)
}
