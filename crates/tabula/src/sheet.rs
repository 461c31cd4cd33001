//! A grid together with its evaluation engine

use crate::calculation::{CalculationCache, CalculationStats};
use tabula_core::{CellId, Grid, GridAccess, Result};
use tabula_formula::{
    DiagnosticSink, EngineOptions, EvaluationContext, LinkResolver, NoLinks, TracingSink, Value,
};

/// An editable grid whose formula cells are evaluated on demand
///
/// Values are memoized until a cell they depend on is edited.
///
/// # Example
///
/// ```rust
/// use tabula::Sheet;
///
/// let mut sheet = Sheet::new(5, 3).unwrap();
/// sheet.set("A1", "5").unwrap();
/// sheet.set("A2", "10").unwrap();
/// sheet.set("A3", "=A1+A2*2").unwrap();
/// assert_eq!(sheet.display("A3").unwrap(), "25");
///
/// sheet.set("A1", "1").unwrap();
/// assert_eq!(sheet.display("A3").unwrap(), "21");
/// ```
pub struct Sheet {
    grid: Grid,
    options: EngineOptions,
    links: Box<dyn LinkResolver>,
    diagnostics: Box<dyn DiagnosticSink>,
    cache: CalculationCache,
}

impl Sheet {
    /// Create an empty sheet
    pub fn new(rows: u32, cols: u16) -> Result<Self> {
        Ok(Self::from_grid(Grid::new(rows, cols)?))
    }

    /// Wrap an existing grid
    pub fn from_grid(grid: Grid) -> Self {
        Self {
            grid,
            options: EngineOptions::default(),
            links: Box::new(NoLinks),
            diagnostics: Box::new(TracingSink),
            cache: CalculationCache::new(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self.cache.clear();
        self
    }

    pub fn with_links<L: LinkResolver + 'static>(mut self, links: L) -> Self {
        self.links = Box::new(links);
        self
    }

    pub fn with_diagnostics<D: DiagnosticSink + 'static>(mut self, diagnostics: D) -> Self {
        self.diagnostics = Box::new(diagnostics);
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    // === Editing ===

    /// Store raw content, invalidating the cell and its dependents
    pub fn set<S: Into<String>>(&mut self, id: &str, content: S) -> Result<()> {
        let cell = self.grid.locate(id)?;
        self.grid.set_at(cell.row, cell.col, content)?;
        self.cache.invalidate(cell);
        Ok(())
    }

    /// Clear a cell
    pub fn clear_cell(&mut self, id: &str) -> Result<()> {
        self.set(id, String::new())
    }

    // === Reading ===

    /// Raw content exactly as stored
    pub fn raw(&self, id: &str) -> Result<&str> {
        self.grid.get(id)
    }

    /// Evaluated value of a cell
    pub fn value(&self, id: &str) -> Result<Value> {
        let cell = self.grid.locate(id)?;
        Ok(self.context().evaluate_cell(cell))
    }

    /// Text shown for a cell
    pub fn display(&self, id: &str) -> Result<String> {
        let cell = self.grid.locate(id)?;
        Ok(self.context().display_cell(cell))
    }

    /// Text shown for every cell, row by row
    pub fn display_grid(&self) -> Vec<Vec<String>> {
        let ctx = self.context();
        (0..self.grid.row_count())
            .map(|row| {
                (0..self.grid.column_count())
                    .map(|col| ctx.display_cell(CellId { row, col }))
                    .collect()
            })
            .collect()
    }

    /// Evaluate formula text that is not stored in the sheet
    pub fn evaluate(&self, content: &str) -> Value {
        self.context().evaluate(content)
    }

    // === Cache ===

    pub fn stats(&self) -> CalculationStats {
        self.cache.stats()
    }

    /// Whether a cell's value is currently memoized
    pub fn is_cached(&self, id: &str) -> Result<bool> {
        Ok(self.cache.is_cached(self.grid.locate(id)?))
    }

    /// Cells whose last evaluation read `id`
    pub fn dependents(&self, id: &str) -> Result<Vec<CellId>> {
        Ok(self.cache.dependents(self.grid.locate(id)?))
    }

    /// Drop every memoized value
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn context(&self) -> EvaluationContext<'_> {
        EvaluationContext::new(&self.grid)
            .with_links(self.links.as_ref())
            .with_diagnostics(self.diagnostics.as_ref())
            .with_options(self.options.clone())
            .with_cache(&self.cache)
    }
}

impl std::fmt::Debug for Sheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sheet")
            .field("grid", &self.grid)
            .field("options", &self.options)
            .field("stats", &self.cache.stats())
            .finish_non_exhaustive()
    }
}
