//! Formula engine contract and the bundled Rhai-backed implementation.
//!
//! The document model only talks to [`FormulaEngine`]. [`RhaiEngine`] keeps
//! the sheet content in a shared map that its registered built-ins read from,
//! and evaluates formula cells on demand.

use log::debug;
use rhai::{Dynamic, Engine, EvalAltResult};
use std::sync::Arc;

use super::format::dynamic_to_value;
use super::{
    CellAddress, CellError, CellRef, EngineValue, RawMatrix, RawValue, Sheet, detect_cycle,
    preprocess_script,
};
use crate::builtins::{CYCLE_ERROR, SharedEvalState, VALUE_ERROR};
use crate::error::{EngineError, Result};

/// Minimal contract between the grid document and a formula evaluator.
///
/// Engines hold their own copy of the sheet. Callers must push the whole
/// content again whenever the grid changed since the last sync.
pub trait FormulaEngine {
    /// Replace the whole content of the (single) sheet.
    fn set_sheet_content(&mut self, content: &RawMatrix) -> Result<()>;

    /// Replace one cell.
    fn set_cell_content(&mut self, address: CellAddress, value: RawValue) -> Result<()>;

    /// Computed value at `address`, or an error marker for that cell.
    fn get_cell_value(&mut self, address: CellAddress) -> Result<EngineValue>;
}

/// Create a Rhai engine with built-ins registered over `sheet`.
pub(crate) fn create_engine(sheet: Sheet, state: SharedEvalState) -> Engine {
    let mut engine = Engine::new();
    crate::builtins::register_builtins(&mut engine, sheet, state);
    engine
}

/// Rhai-backed [`FormulaEngine`] with a single sheet (index 0).
pub struct RhaiEngine {
    sheet: Sheet,
    state: SharedEvalState,
    engine: Engine,
}

impl RhaiEngine {
    pub fn new() -> Self {
        let sheet: Sheet = Arc::new(dashmap::DashMap::new());
        let state = SharedEvalState::default();
        let engine = create_engine(sheet.clone(), state.clone());
        RhaiEngine {
            sheet,
            state,
            engine,
        }
    }

    /// Create an engine already loaded with `content`.
    pub fn from_matrix(content: &RawMatrix) -> Self {
        let engine = Self::new();
        engine.load(content);
        engine
    }

    fn load(&self, content: &RawMatrix) {
        self.state.reset();
        self.sheet.clear();
        for (row, cells) in content.iter().enumerate() {
            for (col, value) in cells.iter().enumerate() {
                if !value.is_null() {
                    self.sheet.insert(CellRef::new(col, row), value.clone());
                }
            }
        }
    }

    fn check_sheet(address: &CellAddress) -> Result<()> {
        if address.sheet == 0 {
            Ok(())
        } else {
            Err(EngineError::NoSuchSheet(address.sheet))
        }
    }

    fn evaluate_formula(&self, cell_ref: CellRef, formula: &str) -> EngineValue {
        if let Some(path) = detect_cycle(&cell_ref, &self.sheet) {
            debug!(
                "circular reference from {}: {}",
                cell_ref,
                path.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(" -> ")
            );
            return EngineValue::Error(CellError::Cycle);
        }

        // Ranges too large for dependency extraction are caught by the
        // evaluation stack instead.
        let script = preprocess_script(formula);
        let result = self.state.enter(cell_ref).and_then(|()| {
            let result = self.engine.eval::<Dynamic>(&script);
            self.state.leave(&cell_ref);
            result
        });
        match result {
            Ok(value) => match dynamic_to_value(&value) {
                EngineValue::Number(n) if n.is_infinite() => {
                    EngineValue::Error(CellError::DivideByZero)
                }
                EngineValue::Number(n) if n.is_nan() => EngineValue::Error(CellError::Num),
                EngineValue::Number(n) => {
                    self.state.remember(cell_ref, n);
                    EngineValue::Number(n)
                }
                other => other,
            },
            Err(err) => {
                debug!("formula {} at {} failed: {}", formula, cell_ref, err);
                EngineValue::Error(map_eval_error(&err))
            }
        }
    }
}

impl Default for RhaiEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FormulaEngine for RhaiEngine {
    fn set_sheet_content(&mut self, content: &RawMatrix) -> Result<()> {
        debug!("loading sheet content with {} rows", content.len());
        self.load(content);
        Ok(())
    }

    fn set_cell_content(&mut self, address: CellAddress, value: RawValue) -> Result<()> {
        Self::check_sheet(&address)?;
        let cell_ref = CellRef::new(address.col, address.row);
        self.state.reset();
        if value.is_null() {
            self.sheet.remove(&cell_ref);
        } else {
            self.sheet.insert(cell_ref, value);
        }
        Ok(())
    }

    fn get_cell_value(&mut self, address: CellAddress) -> Result<EngineValue> {
        Self::check_sheet(&address)?;
        let cell_ref = CellRef::new(address.col, address.row);
        let raw = self.sheet.get(&cell_ref).map(|entry| entry.value().clone());

        Ok(match raw {
            None | Some(RawValue::Null) => EngineValue::Empty,
            Some(RawValue::Number(n)) => EngineValue::Number(n),
            Some(RawValue::Bool(b)) => EngineValue::Bool(b),
            Some(RawValue::Text(text)) => match text.strip_prefix('=') {
                Some(formula) => self.evaluate_formula(cell_ref, formula),
                None => literal_value(&text),
            },
        })
    }
}

/// Interpret literal text the way a spreadsheet does on entry.
fn literal_value(text: &str) -> EngineValue {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return EngineValue::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => EngineValue::Number(n),
        _ => EngineValue::Text(text.to_string()),
    }
}

fn map_eval_error(err: &EvalAltResult) -> CellError {
    match err {
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => map_eval_error(inner),
        EvalAltResult::ErrorRuntime(value, _) => match value.clone().into_string() {
            Ok(code) if code == VALUE_ERROR => CellError::Value,
            Ok(code) if code == CYCLE_ERROR => CellError::Cycle,
            _ => CellError::Eval(value.to_string()),
        },
        EvalAltResult::ErrorArithmetic(..) => CellError::DivideByZero,
        other => CellError::Eval(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawValue {
        RawValue::from(s)
    }

    fn at(row: usize, col: usize) -> CellAddress {
        CellAddress::new(0, row, col)
    }

    #[test]
    fn test_evaluates_arithmetic_over_numeric_text() {
        let mut engine = RhaiEngine::from_matrix(&vec![vec![text("2"), text("3"), text("=A1+B1")]]);
        assert_eq!(engine.get_cell_value(at(0, 2)).unwrap(), EngineValue::Number(5.0));
    }

    #[test]
    fn test_division_uses_floating_point() {
        let mut engine = RhaiEngine::from_matrix(&vec![vec![text("=7/2")]]);
        assert_eq!(engine.get_cell_value(at(0, 0)).unwrap(), EngineValue::Number(3.5));
    }

    #[test]
    fn test_divide_by_zero_is_reported() {
        let mut engine = RhaiEngine::from_matrix(&vec![vec![text("1"), text("=A1/0")]]);
        assert_eq!(
            engine.get_cell_value(at(0, 1)).unwrap(),
            EngineValue::Error(CellError::DivideByZero)
        );
    }

    #[test]
    fn test_text_operand_is_value_error() {
        let mut engine = RhaiEngine::from_matrix(&vec![vec![text("abc"), text("=A1*2")]]);
        assert_eq!(
            engine.get_cell_value(at(0, 1)).unwrap(),
            EngineValue::Error(CellError::Value)
        );
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut engine = RhaiEngine::from_matrix(&vec![vec![text("=B1"), text("=A1")]]);
        assert_eq!(
            engine.get_cell_value(at(0, 0)).unwrap(),
            EngineValue::Error(CellError::Cycle)
        );
    }

    #[test]
    fn test_syntax_error_is_eval_error() {
        let mut engine = RhaiEngine::from_matrix(&vec![vec![text("=1 +* 2")]]);
        assert!(matches!(
            engine.get_cell_value(at(0, 0)).unwrap(),
            EngineValue::Error(CellError::Eval(_))
        ));
    }

    #[test]
    fn test_set_cell_content_updates_dependents() {
        let mut engine = RhaiEngine::from_matrix(&vec![vec![text("1"), text("=A1*10")]]);
        engine.set_cell_content(at(0, 0), RawValue::Number(4.0)).unwrap();
        assert_eq!(engine.get_cell_value(at(0, 1)).unwrap(), EngineValue::Number(40.0));
    }

    #[test]
    fn test_set_sheet_content_replaces_everything() {
        let mut engine = RhaiEngine::from_matrix(&vec![vec![text("1"), text("2")]]);
        engine.set_sheet_content(&vec![vec![text("9")]]).unwrap();
        assert_eq!(engine.get_cell_value(at(0, 1)).unwrap(), EngineValue::Empty);
        assert_eq!(engine.get_cell_value(at(0, 0)).unwrap(), EngineValue::Number(9.0));
    }

    #[test]
    fn test_unknown_sheet_is_rejected() {
        let mut engine = RhaiEngine::new();
        assert!(matches!(
            engine.get_cell_value(CellAddress::new(3, 0, 0)),
            Err(EngineError::NoSuchSheet(3))
        ));
    }

    #[test]
    fn test_range_function_and_if() {
        let mut engine = RhaiEngine::from_matrix(&vec![
            vec![text("1"), text("2")],
            vec![text("3"), text(r#"=IF(SUM(A1:B2) > 5, "big", "small")"#)],
        ]);
        assert_eq!(
            engine.get_cell_value(at(1, 1)).unwrap(),
            EngineValue::Error(CellError::Cycle)
        );

        engine.set_cell_content(at(1, 1), RawValue::Null).unwrap();
        engine.set_cell_content(at(2, 0), text(r#"=IF(SUM(A1:B2) > 5, "big", "small")"#)).unwrap();
        assert_eq!(
            engine.get_cell_value(at(2, 0)).unwrap(),
            EngineValue::Text("big".to_string())
        );
    }

    #[test]
    fn test_self_reference_through_large_range_is_cycle() {
        let mut engine = RhaiEngine::from_matrix(&vec![vec![text("=SUM(A1:ZZ2000)")]]);
        assert_eq!(
            engine.get_cell_value(at(0, 0)).unwrap(),
            EngineValue::Error(CellError::Cycle)
        );
    }

    #[test]
    fn test_cycle_through_two_cells_and_large_range() {
        let mut engine = RhaiEngine::from_matrix(&vec![vec![text("=SUM(B1:ZZ2000)"), text("=A1 + 1")]]);
        assert_eq!(
            engine.get_cell_value(at(0, 0)).unwrap(),
            EngineValue::Error(CellError::Cycle)
        );
        assert_eq!(
            engine.get_cell_value(at(0, 1)).unwrap(),
            EngineValue::Error(CellError::Cycle)
        );
    }

    #[test]
    fn test_whole_sheet_range_over_sparse_content() {
        let mut engine = RhaiEngine::from_matrix(&vec![
            vec![text("=SUM(B1:XFD1048576)"), text("2")],
            vec![RawValue::Null, text("=B1 * 3")],
        ]);
        assert_eq!(engine.get_cell_value(at(0, 0)).unwrap(), EngineValue::Number(8.0));
    }

    #[test]
    fn test_long_chain_evaluated_top_down() {
        let mut column = vec![vec![text("1")]];
        for row in 1..300 {
            column.push(vec![text(&format!("=A{} + 1", row))]);
        }
        let mut engine = RhaiEngine::from_matrix(&column);
        for row in 0..300 {
            assert_eq!(
                engine.get_cell_value(at(row, 0)).unwrap(),
                EngineValue::Number((row + 1) as f64)
            );
        }
    }

    #[test]
    fn test_cached_values_follow_cell_updates() {
        let mut engine = RhaiEngine::from_matrix(&vec![vec![text("1"), text("=A1 * 2"), text("=B1 + 1")]]);
        assert_eq!(engine.get_cell_value(at(0, 2)).unwrap(), EngineValue::Number(3.0));
        engine.set_cell_content(at(0, 0), RawValue::Number(5.0)).unwrap();
        assert_eq!(engine.get_cell_value(at(0, 2)).unwrap(), EngineValue::Number(11.0));
    }
}
