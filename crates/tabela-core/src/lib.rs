//! tabela-core - table model with grouped headers, merged cells and xlsx export.

pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod formula;
pub mod storage;

pub use config::ExportConfig;
pub use document::{ColumnSide, Grid, HeaderGroup, Headers, RowSide, Table, TableCell};
pub use error::{Result, TabelaError};

pub use tabela_engine::engine::{CellRef, FormulaEngine, RhaiEngine};
