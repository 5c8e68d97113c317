//! Formula adapter between the grid and a [`FormulaEngine`].
//!
//! The grid hands the engine a raw matrix (one primitive per cell, formula
//! markers included) and receives display strings back. Export-time helpers
//! live here too: row re-addressing for formulas and numeric coercion of
//! literal text.

use log::{debug, warn};
use regex::{Captures, Regex};
use std::sync::OnceLock;
use tabela_engine::engine::{
    CellAddress, EngineValue, FormulaEngine, RawMatrix, RawValue, followed_by_call, format_number,
    map_outside_strings,
};

use crate::document::Grid;

/// Display text shown for any cell whose evaluation failed.
pub const ERROR_DISPLAY: &str = "#ERRO";

/// Reduce one cell value to an engine primitive. Strings pass through
/// untouched, formula markers included.
pub fn to_raw_cell(value: Option<&str>) -> RawValue {
    match value {
        None => RawValue::Null,
        Some(text) => RawValue::Text(text.to_string()),
    }
}

/// Raw matrix for the whole grid.
pub fn to_raw_matrix(grid: &Grid) -> RawMatrix {
    grid.rows()
        .iter()
        .map(|row| row.iter().map(|cell| to_raw_cell(Some(&cell.value))).collect())
        .collect()
}

/// Stringify an engine result for display.
pub fn display_value(value: &EngineValue) -> String {
    match value {
        EngineValue::Empty => String::new(),
        EngineValue::Number(n) => format_number(*n),
        EngineValue::Bool(b) => b.to_string(),
        EngineValue::Text(s) => s.clone(),
        EngineValue::Error(_) => ERROR_DISPLAY.to_string(),
    }
}

/// Evaluate the cell at `(row, col)` and cache the result on that cell.
///
/// The engine must already hold the grid's current content. Engine errors
/// become [`ERROR_DISPLAY`]; only the target cell's display value changes.
pub fn evaluate<E>(engine: &mut E, grid: &Grid, row: usize, col: usize) -> (Grid, String)
where
    E: FormulaEngine + ?Sized,
{
    let display = match engine.get_cell_value(CellAddress::new(0, row, col)) {
        Ok(value) => display_value(&value),
        Err(err) => {
            debug!("engine rejected ({}, {}): {}", row, col, err);
            ERROR_DISPLAY.to_string()
        }
    };
    let next = grid.set_display_value(row, col, Some(display.clone()));
    (next, display)
}

fn row_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\$?\b[A-Z]{1,3}\$?)([0-9]+)\b").expect("row token regex must compile")
    })
}

/// Add `row_offset` to the row number of every A1 reference in `formula`.
///
/// Column letters stay as they are. Function names such as `LOG10(` and text
/// inside string literals are left alone.
pub fn shift_formula_rows(formula: &str, row_offset: usize) -> String {
    if row_offset == 0 {
        return formula.to_string();
    }
    map_outside_strings(formula, |seg| {
        row_token_re()
            .replace_all(seg, |caps: &Captures| {
                let whole = &caps[0];
                let end = caps.get(0).map_or(0, |m| m.end());
                if followed_by_call(seg, end) {
                    return whole.to_string();
                }
                match caps[2].parse::<usize>() {
                    Ok(row) => format!("{}{}", &caps[1], row + row_offset),
                    Err(_) => whole.to_string(),
                }
            })
            .to_string()
    })
}

/// Turn text that fully parses as a finite number into a number.
///
/// Everything else (including blank text, booleans and nulls) passes through.
pub fn parse_if_number(value: RawValue) -> RawValue {
    match value {
        RawValue::Text(text) => {
            let trimmed = text.trim();
            match trimmed.parse::<f64>() {
                Ok(n) if !trimmed.is_empty() && n.is_finite() => RawValue::Number(n),
                _ => RawValue::Text(text),
            }
        }
        other => other,
    }
}

/// An engine plus the raw matrix it was last synchronized with.
///
/// Evaluation through a session resynchronizes the engine whenever the grid
/// content differs from what the engine last saw.
pub struct FormulaSession<E> {
    engine: E,
    synced: Option<RawMatrix>,
}

impl<E: FormulaEngine> FormulaSession<E> {
    pub fn new(engine: E) -> Self {
        FormulaSession {
            engine,
            synced: None,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Push the grid's content to the engine if it changed.
    /// Returns whether a resync happened.
    pub fn sync(&mut self, grid: &Grid) -> crate::Result<bool> {
        let raw = to_raw_matrix(grid);
        if self.synced.as_ref() == Some(&raw) {
            return Ok(false);
        }
        debug!(
            "resyncing engine with {}x{} grid",
            grid.row_count(),
            grid.col_count()
        );
        // Forget the previous content first so a failed push forces a retry.
        self.synced = None;
        self.engine.set_sheet_content(&raw)?;
        self.synced = Some(raw);
        Ok(true)
    }

    /// Resync if needed, then evaluate one cell.
    pub fn evaluate(&mut self, grid: &Grid, row: usize, col: usize) -> (Grid, String) {
        if let Err(err) = self.sync(grid) {
            warn!("could not sync formula engine: {}", err);
            let display = ERROR_DISPLAY.to_string();
            return (grid.set_display_value(row, col, Some(display.clone())), display);
        }
        evaluate(&mut self.engine, grid, row, col)
    }

    /// Recompute the display value of every formula cell and drop stale
    /// display values from cells that no longer hold formulas.
    pub fn evaluate_all(&mut self, grid: &Grid) -> Grid {
        let mut next = grid.clone();
        for (r, row) in grid.rows().iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if cell.is_formula() {
                    next = self.evaluate(&next, r, c).0;
                } else if cell.display_value.is_some() {
                    next = next.set_display_value(r, c, None);
                }
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabela_engine::engine::{CellError, RhaiEngine};
    use tabela_engine::{EngineError, Result as EngineResult};

    #[test]
    fn test_to_raw_cell_passes_strings_through() {
        assert_eq!(to_raw_cell(None), RawValue::Null);
        assert_eq!(to_raw_cell(Some("=A1+1")), RawValue::Text("=A1+1".into()));
        assert_eq!(to_raw_cell(Some("42")), RawValue::Text("42".into()));
    }

    #[test]
    fn test_to_raw_matrix_keeps_shape() {
        let grid = Grid::from_values([["1", "=A1"], ["", "x"]]);
        let raw = to_raw_matrix(&grid);
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[1], vec![RawValue::Text(String::new()), RawValue::Text("x".into())]);
    }

    #[test]
    fn test_shift_formula_rows_adds_offset() {
        assert_eq!(shift_formula_rows("A1+B1", 1), "A2+B2");
        assert_eq!(shift_formula_rows("SUM(A1:C10)*$D$3", 2), "SUM(A3:C12)*$D$5");
        assert_eq!(shift_formula_rows("A1", 0), "A1");
    }

    #[test]
    fn test_shift_formula_rows_skips_functions_and_strings() {
        assert_eq!(shift_formula_rows(r#"LOG10(A1)&"B2""#, 1), r#"LOG10(A2)&"B2""#);
    }

    #[test]
    fn test_parse_if_number() {
        assert_eq!(parse_if_number(RawValue::from("42")), RawValue::Number(42.0));
        assert_eq!(parse_if_number(RawValue::from(" 2.5 ")), RawValue::Number(2.5));
        assert_eq!(parse_if_number(RawValue::from("1e3")), RawValue::Number(1000.0));
        assert_eq!(parse_if_number(RawValue::from("abc")), RawValue::from("abc"));
        assert_eq!(parse_if_number(RawValue::from("")), RawValue::from(""));
        assert_eq!(parse_if_number(RawValue::from("   ")), RawValue::from("   "));
        assert_eq!(parse_if_number(RawValue::from("NaN")), RawValue::from("NaN"));
        assert_eq!(parse_if_number(RawValue::from("inf")), RawValue::from("inf"));
        assert_eq!(parse_if_number(RawValue::Bool(true)), RawValue::Bool(true));
        assert_eq!(parse_if_number(RawValue::Null), RawValue::Null);
    }

    #[test]
    fn test_display_value_mapping() {
        assert_eq!(display_value(&EngineValue::Empty), "");
        assert_eq!(display_value(&EngineValue::Number(3.0)), "3");
        assert_eq!(display_value(&EngineValue::Number(2.5)), "2.5");
        assert_eq!(display_value(&EngineValue::Bool(true)), "true");
        assert_eq!(
            display_value(&EngineValue::Error(CellError::DivideByZero)),
            ERROR_DISPLAY
        );
    }

    #[test]
    fn test_evaluate_updates_only_target_display() {
        let grid = Grid::from_values([["2", "3", "=A1*B1"]]);
        let mut engine = RhaiEngine::from_matrix(&to_raw_matrix(&grid));
        let (next, shown) = evaluate(&mut engine, &grid, 0, 2);
        assert_eq!(shown, "6");
        assert_eq!(next.get(0, 2).unwrap().display_value.as_deref(), Some("6"));
        assert_eq!(next.get(0, 2).unwrap().value, "=A1*B1");
        assert_eq!(next.get(0, 0), grid.get(0, 0));
        assert!(grid.get(0, 2).unwrap().display_value.is_none());
    }

    #[test]
    fn test_evaluate_maps_errors_to_sentinel() {
        let grid = Grid::from_values([["=1/0"]]);
        let mut engine = RhaiEngine::from_matrix(&to_raw_matrix(&grid));
        let (next, shown) = evaluate(&mut engine, &grid, 0, 0);
        assert_eq!(shown, ERROR_DISPLAY);
        assert_eq!(next.get(0, 0).unwrap().value, "=1/0");
    }

    struct FailingEngine;

    impl FormulaEngine for FailingEngine {
        fn set_sheet_content(&mut self, _content: &RawMatrix) -> EngineResult<()> {
            Ok(())
        }

        fn set_cell_content(&mut self, address: CellAddress, _value: RawValue) -> EngineResult<()> {
            Err(EngineError::NoSuchSheet(address.sheet))
        }

        fn get_cell_value(&mut self, address: CellAddress) -> EngineResult<EngineValue> {
            Err(EngineError::NoSuchSheet(address.sheet))
        }
    }

    #[test]
    fn test_evaluate_maps_engine_failure_to_sentinel() {
        let grid = Grid::from_values([["=A1"]]);
        let (_, shown) = evaluate(&mut FailingEngine, &grid, 0, 0);
        assert_eq!(shown, ERROR_DISPLAY);
    }

    #[test]
    fn test_session_resyncs_after_grid_change() {
        let grid = Grid::from_values([["1", "=A1+1"]]);
        let mut session = FormulaSession::new(RhaiEngine::new());
        assert!(session.sync(&grid).unwrap());
        assert!(!session.sync(&grid).unwrap());

        let (_, first) = session.evaluate(&grid, 0, 1);
        assert_eq!(first, "2");

        let edited = grid.update_cell(0, 0, "41");
        let (_, second) = session.evaluate(&edited, 0, 1);
        assert_eq!(second, "42");
    }

    #[test]
    fn test_evaluate_all_refreshes_formulas_and_clears_stale_displays() {
        let grid = Grid::from_values([["5", "=A1*2", "=B1+1"]]).set_display_value(0, 0, Some("old".into()));
        let mut session = FormulaSession::new(RhaiEngine::new());
        let next = session.evaluate_all(&grid);
        assert_eq!(next.get(0, 0).unwrap().display_value, None);
        assert_eq!(next.get(0, 1).unwrap().display_value.as_deref(), Some("10"));
        assert_eq!(next.get(0, 2).unwrap().display_value.as_deref(), Some("11"));
    }
}
