//! Cell identifier type

use crate::error::{Error, Result};
use crate::MAX_COLS;
use lazy_regex::regex_is_match;
use std::fmt;
use std::str::FromStr;

/// A cell identifier (e.g., "A1", "Z100")
///
/// Identifiers use a single column letter (A-Z) followed by a 1-based row number
/// without leading zeros. Internally both coordinates are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellId {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ..., Z=25)
    pub col: u16,
}

impl CellId {
    /// Create a cell identifier from 0-based coordinates
    pub fn new(row: u32, col: u16) -> Result<Self> {
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS));
        }
        if row == u32::MAX {
            return Err(Error::RowOutOfBounds(row, u32::MAX));
        }
        Ok(Self { row, col })
    }

    /// Parse a cell identifier from `<letter><row>` notation
    ///
    /// # Examples
    /// ```
    /// use tabula_core::CellId;
    ///
    /// let id = CellId::parse("A1").unwrap();
    /// assert_eq!((id.row, id.col), (0, 0));
    ///
    /// let id = CellId::parse("C12").unwrap();
    /// assert_eq!((id.row, id.col), (11, 2));
    ///
    /// assert!(CellId::parse("a1").is_err());
    /// assert!(CellId::parse("A0").is_err());
    /// assert!(CellId::parse("AA1").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        if !Self::is_cell_id(s) {
            return Err(Error::InvalidCellId(s.to_string()));
        }

        let col = (s.as_bytes()[0] - b'A') as u16;
        let row: u32 = s[1..]
            .parse()
            .map_err(|_| Error::InvalidCellId(s.to_string()))?;

        Self::new(row - 1, col).map_err(|_| Error::InvalidCellId(s.to_string()))
    }

    /// Check whether `s` matches the identifier wire format exactly
    pub fn is_cell_id(s: &str) -> bool {
        regex_is_match!(r"^[A-Z][1-9][0-9]*$", s)
    }

    /// The column letter (A-Z)
    pub fn column_letter(&self) -> char {
        (b'A' + self.col as u8) as char
    }

    /// Format as `<letter><row>` string
    pub fn to_a1_string(&self) -> String {
        format!("{}{}", self.column_letter(), self.row as u64 + 1)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
