//! Formula engine API.
//!
//! This module provides the computation side of a table:
//!
//! - [`FormulaEngine`] - The contract the document model evaluates through
//! - [`RhaiEngine`] - Bundled implementation backed by Rhai
//! - [`RawValue`], [`EngineValue`], [`CellError`] - Values crossing the contract
//! - [`CellRef`] - Cell reference parsing (A1 notation ↔ row/col indices)
//! - [`detect_cycle`] - Circular dependency detection
//! - [`extract_dependencies`] - Parse formula dependencies
//! - [`preprocess_script`] - Transform formulas for Rhai evaluation

mod cell_ref;
mod cycle;
mod deps;
mod eval;
mod format;
mod preprocess;
mod value;

use dashmap::DashMap;
use std::sync::Arc;

/// Sheet storage shared between the engine and its built-ins.
pub type Sheet = Arc<DashMap<CellRef, RawValue>>;

pub use cell_ref::CellRef;
pub use cycle::detect_cycle;
pub use deps::extract_dependencies;
pub use eval::{FormulaEngine, RhaiEngine};
pub use format::format_number;
pub use preprocess::{followed_by_call, map_outside_strings, preprocess_script};
pub use value::{CellAddress, CellError, EngineValue, RawMatrix, RawValue};
