//! Values exchanged with the formula engine.
//!
//! A [`RawValue`] is what the document hands to the engine (one per cell, the
//! "raw matrix"). An [`EngineValue`] is what the engine reports back after
//! evaluating an address.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A primitive cell value as consumed by the engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Rows of raw values, row-major.
pub type RawMatrix = Vec<Vec<RawValue>>;

impl RawValue {
    /// Formula text without the leading `=`, if this value is a formula.
    pub fn formula(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => s.strip_prefix('='),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

/// Address of a single cell inside an engine sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub sheet: usize,
    pub row: usize,
    pub col: usize,
}

impl CellAddress {
    pub fn new(sheet: usize, row: usize, col: usize) -> Self {
        CellAddress { sheet, row, col }
    }
}

/// Error markers an engine can report for a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellError {
    /// The formula participates in a circular reference.
    Cycle,
    DivideByZero,
    /// Arithmetic on a non-numeric operand.
    Value,
    /// Non-finite numeric result.
    Num,
    /// Script compilation or runtime failure.
    Eval(String),
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellError::Cycle => write!(f, "#CYCLE!"),
            CellError::DivideByZero => write!(f, "#DIV/0!"),
            CellError::Value => write!(f, "#VALUE!"),
            CellError::Num => write!(f, "#NUM!"),
            CellError::Eval(msg) => write!(f, "#ERR! {}", msg),
        }
    }
}

/// Computed value reported by an engine for one address.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineValue {
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
    Error(CellError),
}
