//! Built-in functions
//!
//! Functions receive their arguments unevaluated so that `if` can evaluate
//! only the selected branch and conditions can be inspected as comparisons.

pub mod aggregate;
pub mod logical;

use crate::ast::Expr;
use crate::evaluator::Frame;
use crate::value::Value;
use ahash::AHashMap;
use std::sync::OnceLock;

/// Function implementation signature
pub type FunctionImpl = fn(&[Expr], &Frame<'_>) -> Value;

/// Function definition
pub struct FunctionDef {
    /// Function name (lowercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    pub implementation: FunctionImpl,
}

impl FunctionDef {
    /// Whether `count` arguments are acceptable
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }

    /// Human-readable arity, e.g. `2 to 3 arguments`
    pub fn arity(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => format!("{} arguments", max),
            Some(max) => format!("{} to {} arguments", self.min_args, max),
            None => format!("at least {} arguments", self.min_args),
        }
    }
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<&'static str, FunctionDef>,
}

static REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

/// The shared registry of built-in functions
pub fn registry() -> &'static FunctionRegistry {
    REGISTRY.get_or_init(FunctionRegistry::new)
}

impl FunctionRegistry {
    /// Create a registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register_aggregate_functions();
        registry.register_logical_functions();

        registry
    }

    /// Look up a function by name, ignoring case
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name.to_ascii_lowercase().as_str())
    }

    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name, def);
    }

    fn register_aggregate_functions(&mut self) {
        self.register(FunctionDef {
            name: "sum",
            min_args: 1,
            max_args: None,
            implementation: aggregate::fn_sum,
        });

        // Divides by the raw argument count, not the count of numbers
        self.register(FunctionDef {
            name: "avg",
            min_args: 1,
            max_args: None,
            implementation: aggregate::fn_avg,
        });

        self.register(FunctionDef {
            name: "count",
            min_args: 1,
            max_args: None,
            implementation: aggregate::fn_count,
        });

        self.register(FunctionDef {
            name: "min",
            min_args: 1,
            max_args: None,
            implementation: aggregate::fn_min,
        });

        self.register(FunctionDef {
            name: "max",
            min_args: 1,
            max_args: None,
            implementation: aggregate::fn_max,
        });
    }

    fn register_logical_functions(&mut self) {
        self.register(FunctionDef {
            name: "if",
            min_args: 2,
            max_args: Some(3),
            implementation: logical::fn_if,
        });

        // Values followed by one criterion
        self.register(FunctionDef {
            name: "countif",
            min_args: 3,
            max_args: None,
            implementation: logical::fn_countif,
        });
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
