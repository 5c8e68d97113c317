//! Export plan: the table laid out as physical sheet rows.
//!
//! The plan is pure data. Header groups become one leading row of spanning
//! header cells, data rows follow, and every merge region is listed once so
//! the writer can declare merges after all values are in place.

use tabela_engine::engine::RawValue;

use crate::document::{Grid, MergeRegion, Table, TableCell};
use crate::formula::{parse_if_number, shift_formula_rows};

/// Write instruction for one physical cell.
#[derive(Clone, Debug, PartialEq)]
pub enum ExportCell {
    Blank,
    Number(f64),
    Bool(bool),
    Text(String),
    /// Formula text without the leading `=`, already addressed for the sheet.
    Formula(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellStyle {
    Header,
    /// Shaded data row.
    Stripe,
    Plain,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportEntry {
    pub cell: ExportCell,
    pub style: CellStyle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportSheet {
    pub rows: Vec<Vec<ExportEntry>>,
    pub merges: Vec<MergeRegion>,
    pub header_row_count: usize,
    pub width: usize,
}

impl ExportSheet {
    pub fn get(&self, row: usize, col: usize) -> Option<&ExportEntry> {
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

/// Header groups as one row of cells: a spanning master at each group's
/// first column followed by merged placeholders.
fn header_row(table: &Table, width: usize) -> Vec<TableCell> {
    let mut row = Vec::with_capacity(width);
    for group in &table.headers {
        let mut master = TableCell::new(group.text.clone());
        if group.span() > 1 {
            master.row_span = Some(1);
            master.col_span = Some(group.span());
        }
        row.push(master);
        for _ in 1..group.span() {
            row.push(TableCell {
                merged: true,
                ..Default::default()
            });
        }
    }
    row.resize(row.len().max(width), TableCell::default());
    row
}

fn export_cell(cell: &TableCell, header_row_count: usize) -> ExportCell {
    if cell.merged {
        return ExportCell::Blank;
    }
    if let Some(formula) = cell.formula()
        && !formula.trim().is_empty()
    {
        return ExportCell::Formula(shift_formula_rows(formula, header_row_count));
    }
    match parse_if_number(RawValue::Text(cell.value.clone())) {
        RawValue::Number(n) => ExportCell::Number(n),
        RawValue::Bool(b) => ExportCell::Bool(b),
        RawValue::Text(text) if text.is_empty() => ExportCell::Blank,
        RawValue::Text(text) => ExportCell::Text(text),
        RawValue::Null => ExportCell::Blank,
    }
}

fn style_for(row: usize, header_row_count: usize) -> CellStyle {
    match row.checked_sub(header_row_count) {
        None => CellStyle::Header,
        Some(data_row) if data_row % 2 == 1 => CellStyle::Stripe,
        Some(_) => CellStyle::Plain,
    }
}

/// Lay out `table` for export.
pub fn build_export_sheet(table: &Table) -> ExportSheet {
    let width = table.headers.total_columns().max(table.grid.col_count());
    let header_row_count = 1;

    let mut physical = vec![header_row(table, width)];
    physical.extend(table.grid.rows().iter().map(|row| {
        let mut row = row.clone();
        row.resize(row.len().max(width), TableCell::default());
        row
    }));
    let physical = Grid::new(physical);

    let rows = physical
        .rows()
        .iter()
        .enumerate()
        .map(|(r, cells)| {
            let style = style_for(r, header_row_count);
            cells
                .iter()
                .map(|cell| ExportEntry {
                    cell: export_cell(cell, header_row_count),
                    style,
                })
                .collect()
        })
        .collect();

    ExportSheet {
        rows,
        merges: physical.merge_regions(),
        header_row_count,
        width,
    }
}
