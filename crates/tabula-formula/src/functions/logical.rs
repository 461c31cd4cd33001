//! Conditional functions

use crate::ast::Expr;
use crate::evaluator::Frame;
use crate::value::{ErrorKind, Value};

/// IF function: `if(left op right; then[; else])`
///
/// Only the selected branch is evaluated.
pub fn fn_if(args: &[Expr], frame: &Frame<'_>) -> Value {
    let Some(Expr::Compare { op, left, right }) = args.first() else {
        return frame.fail(
            ErrorKind::InvalidSyntax,
            "invalid formula: if condition must be a comparison",
        );
    };

    let left = match frame.eval_number(left) {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };
    let right = match frame.eval_number(right) {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };

    match op.select(left, right, args.get(1), args.get(2)) {
        Some(branch) => frame.eval(branch),
        None => frame.fail(
            ErrorKind::InvalidSyntax,
            "invalid formula: condition false without else",
        ),
    }
}

/// COUNTIF function: `countif(v1; ...; vN; op threshold)`
///
/// Every value must be numeric; the first failure aborts the count.
pub fn fn_countif(args: &[Expr], frame: &Frame<'_>) -> Value {
    let Some((Expr::Criterion { op, operand }, values)) = args.split_last() else {
        return frame.fail(
            ErrorKind::InvalidSyntax,
            "invalid formula: countif expects a criterion as its last argument",
        );
    };

    let threshold = match frame.eval_number(operand) {
        Ok(n) => n,
        Err(e) => return Value::Error(e),
    };

    let mut count = 0usize;
    for value in values {
        match frame.eval_number(value) {
            Ok(n) if op.holds(n, threshold) => count += 1,
            Ok(_) => {}
            Err(e) => return Value::Error(e),
        }
    }
    Value::Number(count as f64)
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::CollectingSink;
    use crate::evaluator::EvaluationContext;
    use crate::value::{ErrorKind, Value};
    use pretty_assertions::assert_eq;
    use tabula_core::Grid;

    fn grid() -> Grid {
        let mut grid = Grid::new(5, 3).unwrap();
        grid.set("A1", "5").unwrap();
        grid.set("A2", "10").unwrap();
        grid.set("A3", "3").unwrap();
        grid.set("B1", "hello").unwrap();
        grid
    }

    fn kind(v: &Value) -> Option<ErrorKind> {
        v.get_error().map(|e| e.kind)
    }

    #[test]
    fn test_if_selects_branch() {
        let grid = grid();
        let ctx = EvaluationContext::new(&grid);
        assert_eq!(ctx.display("=if(A1<A2;\"yes\";\"no\")"), "yes");
        assert_eq!(ctx.display("=if(A1>A2;\"yes\";\"no\")"), "no");
        assert_eq!(ctx.evaluate("=if(A1<=5;A2*2;0)"), Value::Number(20.0));
        assert_eq!(ctx.evaluate("=if(A1<>5;1;2)"), Value::Number(2.0));
        assert_eq!(ctx.evaluate("=if(A1+A3=8;1;2)"), Value::Number(1.0));
    }

    #[test]
    fn test_if_evaluates_only_selected_branch() {
        let grid = grid();
        let sink = CollectingSink::new();
        let ctx = EvaluationContext::new(&grid).with_diagnostics(&sink);
        assert_eq!(ctx.evaluate("=if(1<2;7;1/0)"), Value::Number(7.0));
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn test_if_false_without_else() {
        let grid = grid();
        let ctx = EvaluationContext::new(&grid);
        assert_eq!(ctx.evaluate("=if(A1<A2;1)"), Value::Number(1.0));
        assert_eq!(kind(&ctx.evaluate("=if(A1>A2;1)")), Some(ErrorKind::InvalidSyntax));
    }

    #[test]
    fn test_if_condition_errors() {
        let grid = grid();
        let ctx = EvaluationContext::new(&grid);
        assert_eq!(kind(&ctx.evaluate("=if(A1;1;2)")), Some(ErrorKind::InvalidSyntax));
        assert_eq!(kind(&ctx.evaluate("=if(B1<2;1;2)")), Some(ErrorKind::InvalidNumber));
        assert_eq!(kind(&ctx.evaluate("=if(A1=<2;1;2)")), Some(ErrorKind::InvalidSyntax));
        assert_eq!(kind(&ctx.evaluate("=if(A1<2)")), Some(ErrorKind::InvalidFunction));
    }

    #[test]
    fn test_countif() {
        let grid = grid();
        let ctx = EvaluationContext::new(&grid);
        assert_eq!(ctx.evaluate("=countif(A1;A2;A3;>4)"), Value::Number(2.0));
        assert_eq!(ctx.evaluate("=countif(A1;A2;A3;<=5)"), Value::Number(2.0));
        assert_eq!(ctx.evaluate("=countif(A1;A2;=10)"), Value::Number(1.0));
        assert_eq!(ctx.evaluate("=countif(A1;A2;<>10)"), Value::Number(1.0));
    }

    #[test]
    fn test_countif_errors() {
        let grid = grid();
        let ctx = EvaluationContext::new(&grid);
        assert_eq!(kind(&ctx.evaluate("=countif(A1;>4)")), Some(ErrorKind::InvalidFunction));
        assert_eq!(kind(&ctx.evaluate("=countif(A1;A2;A3)")), Some(ErrorKind::InvalidSyntax));
        assert_eq!(kind(&ctx.evaluate("=countif(A1;B1;>4)")), Some(ErrorKind::InvalidNumber));
        assert_eq!(kind(&ctx.evaluate("=countif(A1;A4;>4)")), Some(ErrorKind::InvalidReference));
    }
}
