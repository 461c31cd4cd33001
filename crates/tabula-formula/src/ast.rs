//! Formula Abstract Syntax Tree types

use crate::compare::CompareOp;
use std::collections::BTreeSet;
use tabula_core::{CellId, TableRef};

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// Text literal (quoted string or bare word)
    Text(String),

    // === References ===
    /// Cell in the local grid
    CellRef(CellId),
    /// Cell in another table, resolved externally
    TableRef(TableRef),

    // === Operators ===
    /// Unary operation
    Unary {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    /// Binary arithmetic operation
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    // === Function call ===
    Call { name: String, args: Vec<Expr> },

    // === Conditions (function arguments only) ===
    /// `left op right`, the condition of `if`
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `op operand` with no left side, the trailing criterion of `countif`
    Criterion { op: CompareOp, operand: Box<Expr> },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    /// Map an operator character (`+ - * /`)
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(BinaryOperator::Add),
            '-' => Some(BinaryOperator::Subtract),
            '*' => Some(BinaryOperator::Multiply),
            '/' => Some(BinaryOperator::Divide),
            _ => None,
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
}

impl Expr {
    /// Collect every distinct table reference in this expression
    pub fn table_refs(&self) -> BTreeSet<TableRef> {
        let mut refs = BTreeSet::new();
        self.walk(&mut |expr| {
            if let Expr::TableRef(r) = expr {
                refs.insert(r.clone());
            }
        });
        refs
    }

    /// Visit this node and all of its children, depth first
    pub fn walk<F: FnMut(&Expr)>(&self, visit: &mut F) {
        visit(self);
        match self {
            Expr::Unary { operand, .. } | Expr::Criterion { operand, .. } => operand.walk(visit),
            Expr::Binary { left, right, .. } | Expr::Compare { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.walk(visit);
                }
            }
            Expr::Number(_) | Expr::Text(_) | Expr::CellRef(_) | Expr::TableRef(_) => {}
        }
    }
}
