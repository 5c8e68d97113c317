//! Error types for tabela core.

use thiserror::Error;

use crate::document::LayoutError;
use tabela_engine::EngineError;

/// Errors surfaced by storage, configuration and export.
///
/// Table edits never fail; they return the input unchanged instead.
#[derive(Error, Debug)]
pub enum TabelaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("XLSX write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Invalid table layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Formula engine error: {0}")]
    Engine(#[from] EngineError),
}

pub type Result<T> = std::result::Result<T, TabelaError>;
