//! Table document model (UI-agnostic).
//!
//! A [`Table`] is an immutable snapshot of header groups plus the grid
//! matrix. Every edit is a pure transform returning a new snapshot, so a
//! caller can keep old snapshots around for history.

mod cell;
mod grid;
mod header;
mod merge;
mod structure;
mod validate;

pub use cell::TableCell;
pub use grid::Grid;
pub use header::{ColumnId, ColumnLocation, FlatHeader, HeaderGroup, Headers};
pub use merge::MergeRegion;
pub use validate::LayoutError;

use serde::{Deserialize, Serialize};

/// Largest row or column count a new table may have.
pub const MAX_DIMENSION: usize = 200;

/// Label of the header group created for a new table.
pub const DEFAULT_GROUP_TEXT: &str = "Grupo 1";

/// Where a new row goes relative to the reference row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowSide {
    Above,
    Below,
}

/// Where a new column goes relative to the reference column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnSide {
    Left,
    Right,
}

/// Snapshot pair of header groups and grid matrix.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub headers: Headers,
    pub grid: Grid,
}

/// Clamp a requested row/column count into `1..=MAX_DIMENSION`.
pub fn clamp_dimension(value: usize) -> usize {
    value.clamp(1, MAX_DIMENSION)
}

impl Table {
    pub fn new(headers: Headers, grid: Grid) -> Self {
        Table { headers, grid }
    }

    /// Blank table with one header group spanning every column.
    pub fn new_empty(rows: usize, cols: usize) -> Self {
        let (rows, cols) = (clamp_dimension(rows), clamp_dimension(cols));
        Table {
            headers: Headers::single(cols, DEFAULT_GROUP_TEXT),
            grid: Grid::empty(rows, cols),
        }
    }

    fn with_grid(&self, grid: Grid) -> Self {
        Table {
            headers: self.headers.clone(),
            grid,
        }
    }

    fn with_headers(&self, headers: Headers) -> Self {
        Table {
            headers,
            grid: self.grid.clone(),
        }
    }

    pub fn update_cell(&self, row: usize, col: usize, value: impl Into<String>) -> Self {
        self.with_grid(self.grid.update_cell(row, col, value))
    }

    pub fn insert_row(&self, row: usize, side: RowSide) -> Self {
        self.with_grid(self.grid.insert_row(row, side))
    }

    pub fn remove_row(&self, row: usize) -> Self {
        self.with_grid(self.grid.remove_row(row))
    }

    pub fn merge_columns(&self, row: usize, start_col: usize, end_col: usize) -> Self {
        self.with_grid(self.grid.merge_columns(row, start_col, end_col))
    }

    pub fn merge_rows(&self, col: usize, start_row: usize, end_row: usize) -> Self {
        self.with_grid(self.grid.merge_rows(col, start_row, end_row))
    }

    pub fn merge_block(
        &self,
        start_row: usize,
        end_row: usize,
        start_col: usize,
        end_col: usize,
    ) -> Self {
        self.with_grid(self.grid.merge_block(start_row, end_row, start_col, end_col))
    }

    pub fn merge_headers(&self, start: usize, end: usize) -> Self {
        self.with_headers(self.headers.merge_adjacent(start, end))
    }

    pub fn move_header(&self, from: usize, to: usize) -> Self {
        self.with_headers(self.headers.move_header(from, to))
    }

    pub fn set_header_text(&self, index: usize, text: impl Into<String>) -> Self {
        self.with_headers(self.headers.set_group_text(index, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_empty_has_single_group() {
        let table = Table::new_empty(2, 3);
        assert_eq!(table.headers.len(), 1);
        assert_eq!(table.headers.groups()[0].ids, vec![0, 1, 2]);
        assert_eq!(table.headers.groups()[0].text, DEFAULT_GROUP_TEXT);
        assert_eq!((table.grid.row_count(), table.grid.col_count()), (2, 3));
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_new_empty_clamps_dimensions() {
        let table = Table::new_empty(0, 500);
        assert_eq!(table.grid.row_count(), 1);
        assert_eq!(table.grid.col_count(), MAX_DIMENSION);
        assert_eq!(table.headers.total_columns(), MAX_DIMENSION);
    }

    #[test]
    fn test_row_edits_leave_headers_alone() {
        let table = Table::new_empty(2, 2).merge_headers(0, 0);
        let next = table.insert_row(0, RowSide::Below).update_cell(1, 1, "x");
        assert_eq!(next.headers, table.headers);
        assert_eq!(next.grid.get(1, 1).unwrap().value, "x");
    }
}
