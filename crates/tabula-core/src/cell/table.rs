//! Table-qualified cell identifiers

use crate::cell::CellId;
use crate::error::{Error, Result};
use lazy_regex::regex_captures;
use std::fmt;
use std::str::FromStr;

/// A reference to a cell in another table (e.g., "Sales 2024:B3")
///
/// These are never resolved against the local grid; they are handed to an
/// external resolver in batches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableRef {
    /// Table name, surrounding whitespace removed
    pub table: String,
    /// Cell within that table
    pub cell: CellId,
}

impl TableRef {
    /// Create a new table reference
    pub fn new<S: Into<String>>(table: S, cell: CellId) -> Self {
        Self {
            table: table.into(),
            cell,
        }
    }

    /// Parse `<table-name>:<cell-id>`
    ///
    /// # Examples
    /// ```
    /// use tabula_core::TableRef;
    ///
    /// let r = TableRef::parse("Sales 2024:B3").unwrap();
    /// assert_eq!(r.table, "Sales 2024");
    /// assert_eq!(r.cell.to_string(), "B3");
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let (_, table, cell) = regex_captures!(r"^([\w\s]+):([A-Z][1-9][0-9]*)$", s)
            .ok_or_else(|| Error::InvalidTableRef(s.to_string()))?;

        let table = table.trim();
        if table.is_empty() {
            return Err(Error::InvalidTableRef(s.to_string()));
        }

        let cell = CellId::parse(cell).map_err(|_| Error::InvalidTableRef(s.to_string()))?;
        Ok(Self::new(table, cell))
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table, self.cell)
    }
}

impl FromStr for TableRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
