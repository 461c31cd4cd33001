//! Error types for tabula-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tabula-core
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid cell identifier format
    #[error("Invalid cell identifier: {0}")]
    InvalidCellId(String),

    /// Invalid table-qualified identifier format
    #[error("Invalid table reference: {0}")]
    InvalidTableRef(String),

    /// Row index out of bounds
    #[error("Row index {0} out of bounds (rows: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column index out of bounds
    #[error("Column index {0} out of bounds (columns: {1})")]
    ColumnOutOfBounds(u16, u16),

    /// Grid dimensions not allowed
    #[error("Invalid grid dimensions {rows}x{cols} (columns must be 1..={max_cols}, rows >= 1)")]
    InvalidDimensions { rows: u32, cols: u16, max_cols: u16 },
}
