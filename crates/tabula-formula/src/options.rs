//! Engine configuration

/// How formula text is turned into a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Syntax {
    /// Tokenize and parse into an AST; operator precedence and unary minus
    /// come from the grammar
    #[default]
    Grammar,
    /// Precedence normalisation followed by left-to-right reduction;
    /// operands are still parsed by the grammar
    Textual,
}

/// Options for formula evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineOptions {
    /// Evaluation pipeline
    pub syntax: Syntax,
    /// Memoize formula cells between edits
    pub cache: bool,
    /// Maximum nesting of formula cells referencing formula cells
    pub max_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            syntax: Syntax::Grammar,
            cache: true,
            max_depth: 256,
        }
    }
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
