//! Error types for the formula engine.

use thiserror::Error;

/// Contract violations reported by a formula engine.
///
/// Per-cell evaluation failures are values ([`crate::engine::CellError`]),
/// not errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No such sheet: {0}")]
    NoSuchSheet(usize),
}

pub type Result<T> = std::result::Result<T, EngineError>;
