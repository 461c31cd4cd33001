//! # tabula-core
//!
//! Core data structures for the tabula spreadsheet engine.
//!
//! This crate provides the fundamental types used throughout tabula:
//! - [`CellId`] and [`TableRef`] - Cell addressing, local and table-qualified
//! - [`Grid`] - The bounded grid of raw cell contents
//! - [`GridAccess`] - Read-only view of a grid consumed by the evaluator
//!
//! ## Example
//!
//! ```rust
//! use tabula_core::{CellId, Grid, GridAccess};
//!
//! let mut grid = Grid::new(10, 5).unwrap();
//! grid.set("A1", "5").unwrap();
//! grid.set("B2", "=A1*2").unwrap();
//!
//! let id = CellId::parse("B2").unwrap();
//! assert_eq!(grid.content_at(id.row, id.col), "=A1*2");
//! ```

pub mod cell;
pub mod error;
pub mod grid;

// Re-exports for convenience
pub use cell::{CellId, TableRef};
pub use error::{Error, Result};
pub use grid::{Grid, GridAccess};

/// Maximum number of columns in a grid (letters A-Z)
pub const MAX_COLS: u16 = 26;

/// Marker that starts formula text
pub const FORMULA_MARKER: char = '=';

/// Fixed display text for any value that could not be computed
pub const SENTINEL: &str = "#####";

/// Returns true if `content` is formula text (starts with the formula marker)
pub fn is_formula(content: &str) -> bool {
    content.starts_with(FORMULA_MARKER)
}
