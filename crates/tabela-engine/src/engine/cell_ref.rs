//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "B2", "AA100") and zero-indexed column/row coordinates.
//!
//! # Examples
//!
//! ```
//! use tabela_engine::engine::CellRef;
//!
//! let cell = CellRef::from_str("B3").unwrap();
//! assert_eq!(cell.col, 1); // 0-indexed
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A reference to a cell by column and row indices (0-indexed).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

fn a1_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\$?(?<letters>[A-Za-z]+)\$?(?<numbers>[0-9]+)$")
            .expect("A1 reference regex must compile")
    })
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "B2", "$AA$10").
    /// Returns None if the input is invalid.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<CellRef> {
        Self::parse_a1(name.trim())
    }

    fn parse_a1(name: &str) -> Option<CellRef> {
        let caps = a1_re().captures(name)?;
        let col = Self::letters_to_col(&caps["letters"])?;
        let row = caps["numbers"].parse::<usize>().ok()?.checked_sub(1)?;
        Some(CellRef::new(col, row))
    }

    /// Convert spreadsheet column letters to a zero-based index (A -> 0, AA -> 26).
    pub fn letters_to_col(letters: &str) -> Option<usize> {
        if letters.is_empty() {
            return None;
        }
        let mut col_acc = 0usize;
        for c in letters.to_ascii_uppercase().bytes() {
            if !c.is_ascii_uppercase() {
                return None;
            }
            let digit = (c - b'A') as usize + 1;
            col_acc = col_acc.checked_mul(26)?.checked_add(digit)?;
        }
        col_acc.checked_sub(1)
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

impl std::str::FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_a1(s.trim()).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}
