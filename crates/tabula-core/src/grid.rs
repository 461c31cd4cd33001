//! Grid type

use ahash::AHashMap;

use crate::cell::CellId;
use crate::error::{Error, Result};
use crate::MAX_COLS;

/// Read-only access to the raw contents of a grid
///
/// This is the only view of the grid the evaluator needs; it never mutates cells.
pub trait GridAccess {
    /// Number of rows
    fn row_count(&self) -> u32;

    /// Number of columns (at most [`MAX_COLS`])
    fn column_count(&self) -> u16;

    /// Raw content of a cell, or the empty string if unset or out of bounds
    fn content_at(&self, row: u32, col: u16) -> &str;

    /// Whether `(row, col)` lies inside the grid
    fn in_bounds(&self, row: u32, col: u16) -> bool {
        row < self.row_count() && col < self.column_count()
    }
}

/// A bounded grid of raw cell contents
///
/// Cells hold either plain text or formula text starting with `=`. Contents
/// are stored verbatim; no evaluated values live here.
#[derive(Debug, Clone)]
pub struct Grid {
    rows: u32,
    cols: u16,
    /// Sparse cell storage keyed by (row, col)
    cells: AHashMap<(u32, u16), String>,
}

impl Grid {
    /// Create an empty grid with the given dimensions
    pub fn new(rows: u32, cols: u16) -> Result<Self> {
        if rows == 0 || cols == 0 || cols > MAX_COLS {
            return Err(Error::InvalidDimensions {
                rows,
                cols,
                max_cols: MAX_COLS,
            });
        }

        Ok(Self {
            rows,
            cols,
            cells: AHashMap::new(),
        })
    }

    // === Cell Access ===

    /// Get raw content by identifier string (e.g., "A1")
    pub fn get(&self, id: &str) -> Result<&str> {
        let id = self.locate(id)?;
        Ok(self.content_at(id.row, id.col))
    }

    /// Set raw content by identifier string (e.g., "A1")
    ///
    /// Setting the empty string clears the cell.
    pub fn set<S: Into<String>>(&mut self, id: &str, content: S) -> Result<()> {
        let id = self.locate(id)?;
        self.set_at(id.row, id.col, content)
    }

    /// Set raw content by row and column indices
    pub fn set_at<S: Into<String>>(&mut self, row: u32, col: u16, content: S) -> Result<()> {
        self.check_bounds(row, col)?;

        let content = content.into();
        if content.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), content);
        }
        Ok(())
    }

    /// Remove all cell contents, keeping the dimensions
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Iterate over non-empty cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (CellId, &str)> + '_ {
        let mut keys: Vec<_> = self.cells.keys().copied().collect();
        keys.sort_unstable();
        keys.into_iter().map(move |(row, col)| {
            (
                CellId { row, col },
                self.cells[&(row, col)].as_str(),
            )
        })
    }

    /// Parse an identifier and check it against the grid bounds
    pub fn locate(&self, id: &str) -> Result<CellId> {
        let id = CellId::parse(id)?;
        self.check_bounds(id.row, id.col)?;
        Ok(id)
    }

    fn check_bounds(&self, row: u32, col: u16) -> Result<()> {
        if row >= self.rows {
            return Err(Error::RowOutOfBounds(row, self.rows));
        }
        if col >= self.cols {
            return Err(Error::ColumnOutOfBounds(col, self.cols));
        }
        Ok(())
    }
}

impl GridAccess for Grid {
    fn row_count(&self) -> u32 {
        self.rows
    }

    fn column_count(&self) -> u16 {
        self.cols
    }

    fn content_at(&self, row: u32, col: u16) -> &str {
        self.cells
            .get(&(row, col))
            .map(String::as_str)
            .unwrap_or("")
    }
}
