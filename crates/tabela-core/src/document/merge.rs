//! Merge engine.
//!
//! A master cell owns the `row_span × col_span` rectangle anchored at its own
//! position; every other cell of that rectangle is marked `merged`. Applying a
//! merge first dissolves every existing region that intersects the target
//! rectangle, so regions never overlap and no cell inherits a stale span.

use log::debug;

use super::Grid;

/// Inclusive rectangle of cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeRegion {
    pub top: usize,
    pub left: usize,
    pub bottom: usize,
    pub right: usize,
}

impl MergeRegion {
    pub fn new(top: usize, left: usize, bottom: usize, right: usize) -> Self {
        MergeRegion {
            top,
            left,
            bottom,
            right,
        }
    }

    pub fn rows(&self) -> usize {
        self.bottom - self.top + 1
    }

    pub fn cols(&self) -> usize {
        self.right - self.left + 1
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.top..=self.bottom).contains(&row) && (self.left..=self.right).contains(&col)
    }

    pub fn intersects(&self, other: &MergeRegion) -> bool {
        self.top <= other.bottom
            && other.top <= self.bottom
            && self.left <= other.right
            && other.left <= self.right
    }
}

/// Order two indices and clamp both into `0..len`.
fn normalize(a: usize, b: usize, len: usize) -> (usize, usize) {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let max = len.saturating_sub(1);
    (lo.min(max), hi.min(max))
}

impl Grid {
    /// Regions owned by master cells, in row-major order of their anchors.
    ///
    /// Spans are reported as stored; a region reaching past the grid edge is
    /// a layout error caught by [`Grid::validate`].
    pub fn merge_regions(&self) -> Vec<MergeRegion> {
        let mut regions = Vec::new();
        for (r, row) in self.rows().iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if cell.is_master() {
                    let (rows, cols) = cell.span();
                    regions.push(MergeRegion::new(
                        r,
                        c,
                        r.saturating_add(rows.max(1) - 1),
                        c.saturating_add(cols.max(1) - 1),
                    ));
                }
            }
        }
        regions
    }

    /// Merge `start_col..=end_col` of `row` into one cell.
    pub fn merge_columns(&self, row: usize, start_col: usize, end_col: usize) -> Self {
        let cols = self.col_count();
        if row >= self.row_count() || cols == 0 {
            debug!("merge_columns: row {} out of range", row);
            return self.clone();
        }
        let (sc, ec) = normalize(start_col, end_col, cols);
        if sc >= ec {
            debug!("merge_columns: empty range {}..={}", sc, ec);
            return self.clone();
        }

        let mut next = self.dissolve_intersecting(MergeRegion::new(row, sc, row, ec));
        if let Some(anchor) = next.get_mut(row, sc) {
            anchor.col_span = Some(ec - sc + 1);
        }
        for c in sc + 1..=ec {
            if let Some(cell) = next.get_mut(row, c) {
                cell.merged = true;
            }
        }
        next.checked()
    }

    /// Merge `start_row..=end_row` of column `col` into one cell.
    pub fn merge_rows(&self, col: usize, start_row: usize, end_row: usize) -> Self {
        let rows = self.row_count();
        if col >= self.col_count() || rows == 0 {
            debug!("merge_rows: column {} out of range", col);
            return self.clone();
        }
        let (sr, er) = normalize(start_row, end_row, rows);
        if sr >= er {
            debug!("merge_rows: empty range {}..={}", sr, er);
            return self.clone();
        }

        let mut next = self.dissolve_intersecting(MergeRegion::new(sr, col, er, col));
        if let Some(anchor) = next.get_mut(sr, col) {
            anchor.row_span = Some(er - sr + 1);
        }
        for r in sr + 1..=er {
            if let Some(cell) = next.get_mut(r, col) {
                cell.merged = true;
            }
        }
        next.checked()
    }

    /// Merge a rectangular block into one cell anchored at its top-left.
    ///
    /// A block that clamps down to a single cell is a no-op.
    pub fn merge_block(
        &self,
        start_row: usize,
        end_row: usize,
        start_col: usize,
        end_col: usize,
    ) -> Self {
        let (rows, cols) = (self.row_count(), self.col_count());
        if rows == 0 || cols == 0 {
            return self.clone();
        }
        let (sr, er) = normalize(start_row, end_row, rows);
        let (sc, ec) = normalize(start_col, end_col, cols);
        if sr == er && sc == ec {
            debug!("merge_block: ({}, {}) is a single cell", sr, sc);
            return self.clone();
        }

        let region = MergeRegion::new(sr, sc, er, ec);
        let mut next = self.dissolve_intersecting(region);
        if let Some(anchor) = next.get_mut(sr, sc) {
            anchor.row_span = Some(region.rows());
            anchor.col_span = Some(region.cols());
        }
        for r in sr..=er {
            for c in sc..=ec {
                if (r, c) == (sr, sc) {
                    continue;
                }
                if let Some(cell) = next.get_mut(r, c) {
                    cell.merged = true;
                }
            }
        }
        next.checked()
    }

    /// Clear every region intersecting `target`, plus any merge state left
    /// inside `target` itself.
    fn dissolve_intersecting(&self, target: MergeRegion) -> Self {
        let mut next = self.clone();
        for region in self.merge_regions() {
            if region.intersects(&target) {
                next.clear_region(region);
            }
        }
        next.clear_region(target);
        next
    }

    fn clear_region(&mut self, region: MergeRegion) {
        for r in region.top..=region.bottom {
            for c in region.left..=region.right {
                if let Some(cell) = self.get_mut(r, c) {
                    cell.clear_merge();
                }
            }
        }
    }
}
