//! Built-in spreadsheet functions (Rust) and their metadata.
//!
//! Conventions:
//! - Spreadsheet-facing built-in names are ALL CAPS (e.g. `SUM`, `AVG`).
//! - Range built-ins rewrite to ALLCAPS Rhai function names (e.g. `SUM_RANGE`).
//! - If you add a new built-in range function, update `RANGE_BUILTINS` and
//!   register its implementation in `register_builtins`.

use crate::engine::{CellRef, RawValue, Sheet, preprocess_script};
use dashmap::{DashMap, DashSet};
use regex::Regex;
use rhai::{Dynamic, Engine, EvalAltResult, NativeCallContext, Position};

use std::sync::{Arc, OnceLock};

pub struct RangeBuiltin {
    pub sheet_name: &'static str,
    pub rhai_name: &'static str,
    #[allow(dead_code)]
    pub description: &'static str,
}

pub const RANGE_BUILTINS: &[RangeBuiltin] = &[
    RangeBuiltin {
        sheet_name: "SUM",
        rhai_name: "SUM_RANGE",
        description: "Sum of numeric values in a cell range",
    },
    RangeBuiltin {
        sheet_name: "AVG",
        rhai_name: "AVG_RANGE",
        description: "Average of numeric values in a cell range",
    },
    RangeBuiltin {
        sheet_name: "AVERAGE",
        rhai_name: "AVG_RANGE",
        description: "Average of numeric values in a cell range",
    },
    RangeBuiltin {
        sheet_name: "COUNT",
        rhai_name: "COUNT_RANGE",
        description: "Count of numeric cells in a cell range",
    },
    RangeBuiltin {
        sheet_name: "MIN",
        rhai_name: "MIN_RANGE",
        description: "Minimum numeric value in a cell range",
    },
    RangeBuiltin {
        sheet_name: "MAX",
        rhai_name: "MAX_RANGE",
        description: "Maximum numeric value in a cell range",
    },
];

/// Error code raised when a referenced cell holds non-numeric text.
pub const VALUE_ERROR: &str = "#VALUE!";

/// Error code raised when a formula reaches a cell that is still being evaluated.
pub const CYCLE_ERROR: &str = "#CYCLE!";

/// Deepest chain of nested formula cells evaluated for one top-level cell.
pub const MAX_EVAL_DEPTH: usize = 64;

/// Evaluation bookkeeping shared by an engine and its built-ins.
///
/// `active` holds the formula cells currently on the evaluation stack and
/// `values` the numeric results computed since the sheet last changed.
#[derive(Debug, Default)]
pub struct EvalState {
    active: DashSet<CellRef>,
    values: DashMap<CellRef, f64>,
}

pub type SharedEvalState = Arc<EvalState>;

impl EvalState {
    /// Push `cell_ref` onto the evaluation stack.
    pub fn enter(&self, cell_ref: CellRef) -> Result<(), Box<EvalAltResult>> {
        if self.active.contains(&cell_ref) {
            return Err(runtime_error(CYCLE_ERROR));
        }
        if self.active.len() >= MAX_EVAL_DEPTH {
            return Err(runtime_error(&format!(
                "formula chain deeper than {} cells",
                MAX_EVAL_DEPTH
            )));
        }
        self.active.insert(cell_ref);
        Ok(())
    }

    pub fn leave(&self, cell_ref: &CellRef) {
        self.active.remove(cell_ref);
    }

    pub fn cached(&self, cell_ref: &CellRef) -> Option<f64> {
        self.values.get(cell_ref).map(|entry| *entry.value())
    }

    pub fn remember(&self, cell_ref: CellRef, value: f64) {
        self.values.insert(cell_ref, value);
    }

    /// Forget computed values. Called whenever sheet content changes.
    pub fn reset(&self) {
        self.active.clear();
        self.values.clear();
    }
}

/// Regex that matches built-in range calls like `SUM(A1:B5)`.
///
/// Captures:
/// - group 1: function name (e.g. `SUM`)
/// - group 2: start cell ref (e.g. `A1`)
/// - group 3: end cell ref (e.g. `B5`)
pub fn range_fn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let names = RANGE_BUILTINS
            .iter()
            .map(|b| b.sheet_name)
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(
            r"\b({})\(\s*(\$?[A-Za-z]+\$?[0-9]+)\s*:\s*(\$?[A-Za-z]+\$?[0-9]+)\s*\)",
            names
        ))
        .expect("built-in range regex must compile")
    })
}

pub fn range_rhai_name(sheet_name: &str) -> Option<&'static str> {
    RANGE_BUILTINS
        .iter()
        .find(|b| b.sheet_name == sheet_name)
        .map(|b| b.rhai_name)
}

fn runtime_error(message: &str) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(message.into(), Position::NONE).into()
}

fn to_index(value: i64) -> Result<usize, Box<EvalAltResult>> {
    usize::try_from(value).map_err(|_| runtime_error("cell index must be >= 0"))
}

fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn dynamic_number(value: &Dynamic) -> Option<f64> {
    if let Ok(n) = value.as_float() {
        Some(n)
    } else if let Ok(n) = value.as_int() {
        Some(n as f64)
    } else if let Ok(b) = value.as_bool() {
        Some(if b { 1.0 } else { 0.0 })
    } else {
        None
    }
}

/// Resolve the value at `cell_ref`, evaluating formulas recursively.
///
/// `Ok(None)` means the cell is empty or holds text that is not a number.
/// Re-entering a cell already on the evaluation stack raises [`CYCLE_ERROR`].
fn resolve_number(
    ctx: &NativeCallContext,
    sheet: &Sheet,
    state: &EvalState,
    cell_ref: CellRef,
) -> Result<Option<f64>, Box<EvalAltResult>> {
    let raw = match sheet.get(&cell_ref) {
        Some(entry) => entry.value().clone(),
        None => return Ok(None),
    };

    match raw {
        RawValue::Null => Ok(None),
        RawValue::Number(n) => Ok(Some(n)),
        RawValue::Bool(b) => Ok(Some(if b { 1.0 } else { 0.0 })),
        RawValue::Text(s) => match s.strip_prefix('=') {
            Some(formula) => {
                if let Some(n) = state.cached(&cell_ref) {
                    return Ok(Some(n));
                }
                state.enter(cell_ref)?;
                let result = ctx.engine().eval::<Dynamic>(&preprocess_script(formula));
                state.leave(&cell_ref);

                let number = dynamic_number(&result?);
                if let Some(n) = number {
                    state.remember(cell_ref, n);
                }
                Ok(number)
            }
            None if s.trim().is_empty() => Ok(None),
            None => Ok(parse_number(&s)),
        },
    }
}

/// Collect the numeric values of a rectangular range (text and blanks skipped).
///
/// Only populated cells are visited, in row-major order.
fn range_numbers(
    ctx: &NativeCallContext,
    sheet: &Sheet,
    state: &EvalState,
    c1: i64,
    r1: i64,
    c2: i64,
    r2: i64,
) -> Result<Vec<f64>, Box<EvalAltResult>> {
    let (c1, r1, c2, r2) = (to_index(c1)?, to_index(r1)?, to_index(c2)?, to_index(r2)?);
    let (min_col, max_col) = (c1.min(c2), c1.max(c2));
    let (min_row, max_row) = (r1.min(r2), r1.max(r2));

    let mut cells: Vec<CellRef> = sheet
        .iter()
        .map(|entry| *entry.key())
        .filter(|c| (min_col..=max_col).contains(&c.col) && (min_row..=max_row).contains(&c.row))
        .collect();
    cells.sort_by_key(|c| (c.row, c.col));

    let mut out = Vec::new();
    for cell_ref in cells {
        if let Some(n) = resolve_number(ctx, sheet, state, cell_ref)? {
            out.push(n);
        }
    }
    Ok(out)
}

/// Register all built-in functions into the Rhai engine.
pub fn register_builtins(engine: &mut Engine, sheet: Sheet, state: SharedEvalState) {
    // CELL(col, row): numeric value at cell (blank -> 0, text -> #VALUE!)
    let sheet_cell = sheet.clone();
    let state_cell = state.clone();
    engine.register_fn(
        "CELL",
        move |ctx: NativeCallContext, col: i64, row: i64| -> Result<f64, Box<EvalAltResult>> {
            let cell_ref = CellRef::new(to_index(col)?, to_index(row)?);
            match resolve_number(&ctx, &sheet_cell, &state_cell, cell_ref)? {
                Some(n) => Ok(n),
                None => {
                    let blank = match sheet_cell.get(&cell_ref) {
                        None => true,
                        Some(entry) => match entry.value() {
                            RawValue::Null => true,
                            RawValue::Text(s) => s.trim().is_empty(),
                            _ => false,
                        },
                    };
                    if blank {
                        Ok(0.0)
                    } else {
                        Err(runtime_error(VALUE_ERROR))
                    }
                }
            }
        },
    );

    let sheet_sum = sheet.clone();
    let state_sum = state.clone();
    engine.register_fn(
        "SUM_RANGE",
        move |ctx: NativeCallContext, c1: i64, r1: i64, c2: i64, r2: i64| {
            Ok::<f64, Box<EvalAltResult>>(
                range_numbers(&ctx, &sheet_sum, &state_sum, c1, r1, c2, r2)?.iter().sum(),
            )
        },
    );

    let sheet_avg = sheet.clone();
    let state_avg = state.clone();
    engine.register_fn(
        "AVG_RANGE",
        move |ctx: NativeCallContext, c1: i64, r1: i64, c2: i64, r2: i64| {
            let values = range_numbers(&ctx, &sheet_avg, &state_avg, c1, r1, c2, r2)?;
            if values.is_empty() {
                return Ok::<f64, Box<EvalAltResult>>(f64::INFINITY);
            }
            Ok(values.iter().sum::<f64>() / values.len() as f64)
        },
    );

    let sheet_count = sheet.clone();
    let state_count = state.clone();
    engine.register_fn(
        "COUNT_RANGE",
        move |ctx: NativeCallContext, c1: i64, r1: i64, c2: i64, r2: i64| {
            Ok::<f64, Box<EvalAltResult>>(
                range_numbers(&ctx, &sheet_count, &state_count, c1, r1, c2, r2)?.len() as f64,
            )
        },
    );

    let sheet_min = sheet.clone();
    let state_min = state.clone();
    engine.register_fn(
        "MIN_RANGE",
        move |ctx: NativeCallContext, c1: i64, r1: i64, c2: i64, r2: i64| {
            let values = range_numbers(&ctx, &sheet_min, &state_min, c1, r1, c2, r2)?;
            Ok::<f64, Box<EvalAltResult>>(values.into_iter().reduce(f64::min).unwrap_or(0.0))
        },
    );

    let sheet_max = sheet;
    let state_max = state;
    engine.register_fn(
        "MAX_RANGE",
        move |ctx: NativeCallContext, c1: i64, r1: i64, c2: i64, r2: i64| {
            let values = range_numbers(&ctx, &sheet_max, &state_max, c1, r1, c2, r2)?;
            Ok::<f64, Box<EvalAltResult>>(values.into_iter().reduce(f64::max).unwrap_or(0.0))
        },
    );

    engine.register_fn("IF", |cond: bool, yes: Dynamic, no: Dynamic| -> Dynamic {
        if cond { yes } else { no }
    });
    engine.register_fn("ABS", |x: f64| -> f64 { x.abs() });
    engine.register_fn("SQRT", |x: f64| -> f64 { x.sqrt() });
    engine.register_fn("POW", |base: f64, exp: f64| -> f64 { base.powf(exp) });
    engine.register_fn("ROUND", |x: f64, digits: f64| -> f64 {
        let factor = 10f64.powi(digits as i32);
        (x * factor).round() / factor
    });
}
