//! Grid matrix: the row-major rectangular store of cells.
//!
//! Every transform takes `&self` and returns a new grid; out-of-range indices
//! and minimum-size violations return an unchanged copy. Structural edits
//! (row/column insert or remove) clear every merge region first, because
//! shifting indices would leave anchored spans straddling the wrong cells.

use log::debug;
use serde::{Deserialize, Serialize};

use super::{ColumnSide, RowSide, TableCell};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    rows: Vec<Vec<TableCell>>,
}

impl Grid {
    /// Wrap rows as-is; use [`Grid::validate`] to check untrusted input.
    pub fn new(rows: Vec<Vec<TableCell>>) -> Self {
        Grid { rows }
    }

    /// `rows × cols` grid of empty cells.
    pub fn empty(rows: usize, cols: usize) -> Self {
        Grid {
            rows: vec![vec![TableCell::default(); cols]; rows],
        }
    }

    /// Build a grid of plain cells from values.
    pub fn from_values<R, V>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Grid {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(TableCell::new).collect())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Vec<TableCell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.rows.get(row)?.get(col)
    }

    pub(crate) fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut TableCell> {
        self.rows.get_mut(row)?.get_mut(col)
    }

    pub(crate) fn cells_mut(&mut self) -> impl Iterator<Item = &mut TableCell> {
        self.rows.iter_mut().flatten()
    }

    /// Debug-build check that a transform kept every layout invariant.
    pub(crate) fn checked(self) -> Self {
        debug_assert!(
            self.validate().is_ok(),
            "grid invariant violated: {:?}",
            self.validate()
        );
        self
    }

    /// Replace the value of one cell.
    pub fn update_cell(&self, row: usize, col: usize, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        match next.get_mut(row, col) {
            Some(cell) => cell.value = value.into(),
            None => debug!("update_cell({}, {}) out of range", row, col),
        }
        next
    }

    /// Replace the cached display value of one cell.
    pub fn set_display_value(&self, row: usize, col: usize, display: Option<String>) -> Self {
        let mut next = self.clone();
        if let Some(cell) = next.get_mut(row, col) {
            cell.display_value = display;
        }
        next
    }

    /// Reset `merged`/`row_span`/`col_span` on every cell.
    pub fn clear_all_merges(&self) -> Self {
        let mut next = self.clone();
        next.cells_mut().for_each(TableCell::clear_merge);
        next
    }

    /// Insert an empty row above or below `row`.
    pub fn insert_row(&self, row: usize, side: RowSide) -> Self {
        let cols = self.col_count();
        if cols == 0 || row >= self.row_count() {
            debug!("insert_row({}) ignored", row);
            return self.clone();
        }
        let mut next = self.clear_all_merges();
        let target = match side {
            RowSide::Above => row,
            RowSide::Below => row + 1,
        };
        next.rows.insert(target, vec![TableCell::default(); cols]);
        next.checked()
    }

    /// Remove `row`; the last remaining row is never removed.
    pub fn remove_row(&self, row: usize) -> Self {
        if self.row_count() <= 1 || row >= self.row_count() {
            debug!("remove_row({}) ignored", row);
            return self.clone();
        }
        let mut next = self.clear_all_merges();
        next.rows.remove(row);
        next.checked()
    }

    /// Insert an empty cell left or right of `col` in every row.
    pub fn insert_column(&self, col: usize, side: ColumnSide) -> Self {
        let cols = self.col_count();
        if cols > 0 && col >= cols {
            debug!("insert_column({}) ignored", col);
            return self.clone();
        }
        let target = match side {
            ColumnSide::Left => col,
            ColumnSide::Right => col + 1,
        }
        .min(cols);
        let mut next = self.clear_all_merges();
        for row in next.rows.iter_mut() {
            row.insert(target, TableCell::default());
        }
        next.checked()
    }

    /// Remove `col` from every row; the last remaining column is never removed.
    pub fn remove_column(&self, col: usize) -> Self {
        let cols = self.col_count();
        if cols <= 1 || col >= cols {
            debug!("remove_column({}) ignored", col);
            return self.clone();
        }
        let mut next = self.clear_all_merges();
        for row in next.rows.iter_mut() {
            row.remove(col);
        }
        next.checked()
    }
}
