//! Cell addressing types
//!
//! This module contains:
//! - [`CellId`] - A cell's location in the local grid (e.g., "B12")
//! - [`TableRef`] - A cell in another table (e.g., "Sales 2024:B12")

mod address;
mod table;

pub use address::CellId;
pub use table::TableRef;
