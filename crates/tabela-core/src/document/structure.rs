//! Structure mutator: column edits that keep headers and grid in lockstep.

use log::debug;

use super::{ColumnSide, Table};

impl Table {
    /// Insert a column next to `col` in both the grid and the header groups.
    ///
    /// The new column joins the header group owning the insertion boundary.
    pub fn insert_column(&self, col: usize, side: ColumnSide) -> Self {
        let width = self.grid.col_count();
        if width > 0 && col >= width {
            debug!("insert_column({}) out of range", col);
            return self.clone();
        }
        Table {
            headers: self.headers.insert_column(col, side),
            grid: self.grid.insert_column(col, side),
        }
        .checked()
    }

    /// Remove column `col` from both the grid and the header groups; a header
    /// group left without columns is dropped.
    pub fn remove_column(&self, col: usize) -> Self {
        let width = self.grid.col_count();
        if width <= 1 || col >= width {
            debug!("remove_column({}) ignored", col);
            return self.clone();
        }
        Table {
            headers: self.headers.remove_column(col),
            grid: self.grid.remove_column(col),
        }
        .checked()
    }

    fn checked(self) -> Self {
        debug_assert_eq!(
            self.headers.total_columns(),
            self.grid.col_count(),
            "headers and grid disagree on width"
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Grid, HeaderGroup, Headers};

    fn two_columns() -> Table {
        Table::new(
            Headers::new(vec![HeaderGroup::new(vec![0, 1], "G")]),
            Grid::from_values([["a", "b"], ["c", "d"]]),
        )
    }

    #[test]
    fn test_insert_column_left_joins_group() {
        let next = two_columns().insert_column(1, ColumnSide::Left);
        assert_eq!(next.headers.groups()[0].ids, vec![0, 2, 1]);
        for row in next.grid.rows() {
            assert_eq!(row.len(), 3);
            assert_eq!(row[1].value, "");
        }
        assert_eq!(next.grid.get(1, 2).unwrap().value, "d");
        assert!(next.validate().is_ok());
    }

    #[test]
    fn test_remove_column_drops_emptied_group() {
        let table = Table::new(
            Headers::new(vec![
                HeaderGroup::new(vec![0], "A"),
                HeaderGroup::new(vec![1], "B"),
            ]),
            Grid::from_values([["a", "b"]]),
        );
        let next = table.remove_column(0);
        assert_eq!(next.headers.len(), 1);
        assert_eq!(next.headers.groups()[0].text, "B");
        assert_eq!(next.grid.get(0, 0).unwrap().value, "b");
        assert!(next.validate().is_ok());
    }

    #[test]
    fn test_column_minimum_and_range() {
        let single = Table::new_empty(2, 1);
        assert_eq!(single.remove_column(0), single);
        assert_eq!(two_columns().remove_column(2), two_columns());
        assert_eq!(two_columns().insert_column(5, ColumnSide::Right), two_columns());
    }

    #[test]
    fn test_width_stays_consistent_across_edits() {
        let mut table = two_columns().merge_block(0, 1, 0, 1);
        let edits: Vec<fn(&Table) -> Table> = vec![
            |t: &Table| t.insert_column(0, ColumnSide::Right),
            |t: &Table| t.insert_column(2, ColumnSide::Right),
            |t: &Table| t.remove_column(1),
            |t: &Table| t.merge_headers(0, 0),
            |t: &Table| t.remove_column(0),
        ];
        for edit in edits {
            table = edit(&table);
            assert_eq!(table.headers.total_columns(), table.grid.col_count());
            assert!(table.validate().is_ok());
        }
    }
}
