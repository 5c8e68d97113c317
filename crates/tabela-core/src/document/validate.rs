//! Layout validation shared by every mutator and by loaders.

use std::collections::HashSet;

use thiserror::Error;

use super::{Grid, Headers, Table};

/// A broken layout invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("cell ({row}, {col}) has a zero span")]
    ZeroSpan { row: usize, col: usize },

    #[error("merge region anchored at ({row}, {col}) extends past the grid")]
    SpanOutOfBounds { row: usize, col: usize },

    #[error("merged cell ({row}, {col}) carries its own span")]
    SlaveWithSpan { row: usize, col: usize },

    #[error("cell ({row}, {col}) is covered by more than one merge region")]
    OverlappingMerge { row: usize, col: usize },

    #[error("cell ({row}, {col}) is marked merged but no region covers it")]
    OrphanMerged { row: usize, col: usize },

    #[error("header group {0} has no columns")]
    EmptyHeaderGroup(usize),

    #[error("column id {0} appears more than once")]
    DuplicateColumnId(u64),

    #[error("headers span {headers} columns but the grid has {grid}")]
    WidthMismatch { headers: usize, grid: usize },

    #[error("a table needs at least one row and one column")]
    Empty,
}

impl Headers {
    /// Check the partition invariant: non-empty groups, unique ids.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let mut seen = HashSet::new();
        for (index, group) in self.iter().enumerate() {
            if group.ids.is_empty() {
                return Err(LayoutError::EmptyHeaderGroup(index));
            }
            for &id in &group.ids {
                if !seen.insert(id) {
                    return Err(LayoutError::DuplicateColumnId(id));
                }
            }
        }
        Ok(())
    }
}

impl Grid {
    /// Check rectangularity and merge exclusivity.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let (rows, cols) = (self.row_count(), self.col_count());
        for (row, cells) in self.rows().iter().enumerate() {
            if cells.len() != cols {
                return Err(LayoutError::Ragged {
                    row,
                    expected: cols,
                    found: cells.len(),
                });
            }
        }

        let mut coverage = vec![vec![0u8; cols]; rows];
        for (row, cells) in self.rows().iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                if cell.row_span == Some(0) || cell.col_span == Some(0) {
                    return Err(LayoutError::ZeroSpan { row, col });
                }
                if cell.merged && (cell.row_span.is_some() || cell.col_span.is_some()) {
                    return Err(LayoutError::SlaveWithSpan { row, col });
                }
                if !cell.is_master() {
                    continue;
                }
                let (row_span, col_span) = cell.span();
                if row_span > rows - row || col_span > cols - col {
                    return Err(LayoutError::SpanOutOfBounds { row, col });
                }
                for r in row..row + row_span {
                    for c in col..col + col_span {
                        if (r, c) == (row, col) {
                            continue;
                        }
                        coverage[r][c] += 1;
                        if coverage[r][c] > 1 || !self.rows()[r][c].merged {
                            return Err(LayoutError::OverlappingMerge { row: r, col: c });
                        }
                    }
                }
            }
        }

        for (row, cells) in self.rows().iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                if cell.merged && coverage[row][col] == 0 {
                    return Err(LayoutError::OrphanMerged { row, col });
                }
            }
        }
        Ok(())
    }
}

impl Table {
    /// Check every layout invariant of the snapshot pair.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.grid.row_count() == 0 || self.grid.col_count() == 0 {
            return Err(LayoutError::Empty);
        }
        self.headers.validate()?;
        self.grid.validate()?;
        let headers = self.headers.total_columns();
        if headers != self.grid.col_count() {
            return Err(LayoutError::WidthMismatch {
                headers,
                grid: self.grid.col_count(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{HeaderGroup, TableCell};

    #[test]
    fn test_ragged_grid_is_rejected() {
        let grid = Grid::new(vec![vec![TableCell::default(); 2], vec![TableCell::default()]]);
        assert!(matches!(grid.validate(), Err(LayoutError::Ragged { row: 1, .. })));
    }

    #[test]
    fn test_orphan_and_overlap_are_rejected() {
        let mut rows = vec![vec![TableCell::default(); 3]; 2];
        rows[1][2].merged = true;
        assert_eq!(
            Grid::new(rows.clone()).validate(),
            Err(LayoutError::OrphanMerged { row: 1, col: 2 })
        );

        rows[1][2].merged = false;
        rows[0][0].col_span = Some(2);
        rows[0][1].merged = true;
        rows[0][1].col_span = None;
        assert!(Grid::new(rows.clone()).validate().is_ok());

        rows[0][1].merged = false;
        rows[0][1].col_span = Some(2);
        assert_eq!(
            Grid::new(rows).validate(),
            Err(LayoutError::OverlappingMerge { row: 0, col: 1 })
        );
    }

    #[test]
    fn test_span_past_edge_is_rejected() {
        let mut rows = vec![vec![TableCell::default(); 2]; 2];
        rows[1][1].row_span = Some(2);
        assert_eq!(
            Grid::new(rows).validate(),
            Err(LayoutError::SpanOutOfBounds { row: 1, col: 1 })
        );
    }

    #[test]
    fn test_huge_span_is_out_of_bounds() {
        let mut rows = vec![vec![TableCell::default(); 2]; 2];
        rows[1][0].row_span = Some(usize::MAX);
        assert_eq!(
            Grid::new(rows.clone()).validate(),
            Err(LayoutError::SpanOutOfBounds { row: 1, col: 0 })
        );

        rows[1][0].row_span = None;
        rows[0][1].col_span = Some(usize::MAX);
        assert_eq!(
            Grid::new(rows).validate(),
            Err(LayoutError::SpanOutOfBounds { row: 0, col: 1 })
        );
    }

    #[test]
    fn test_header_partition_checks() {
        let dup = Headers::new(vec![
            HeaderGroup::new(vec![0, 1], "A"),
            HeaderGroup::new(vec![1], "B"),
        ]);
        assert_eq!(dup.validate(), Err(LayoutError::DuplicateColumnId(1)));

        let empty = Headers::new(vec![HeaderGroup::new(vec![], "A")]);
        assert_eq!(empty.validate(), Err(LayoutError::EmptyHeaderGroup(0)));
    }

    #[test]
    fn test_table_width_mismatch() {
        let table = Table::new(Headers::single(2, "G"), Grid::empty(1, 3));
        assert_eq!(
            table.validate(),
            Err(LayoutError::WidthMismatch {
                headers: 2,
                grid: 3
            })
        );
    }
}
