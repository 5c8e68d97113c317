//! Excel export.
//!
//! A table is first laid out as an [`ExportSheet`] plan, then rendered to an
//! `.xlsx` buffer and written next to its final name before being renamed
//! into place, so a failed export never leaves a partial file behind.

mod plan;
mod xlsx;

pub use plan::{CellStyle, ExportCell, ExportEntry, ExportSheet, build_export_sheet};
pub use xlsx::render_workbook;

use chrono::{NaiveDate, Utc};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ExportConfig;
use crate::document::Table;
use crate::error::Result;

/// Stem used when none is given.
pub const DEFAULT_STEM: &str = "tabela";

/// `<stem>-<YYYY-MM-DD>.xlsx`, falling back to [`DEFAULT_STEM`] for a blank
/// stem.
pub fn export_file_name(stem: &str, date: NaiveDate) -> String {
    file_name_with_default(stem, DEFAULT_STEM, date)
}

fn file_name_with_default(stem: &str, default_stem: &str, date: NaiveDate) -> String {
    let stem = match stem.trim() {
        "" => default_stem.trim(),
        trimmed => trimmed,
    };
    // The stem names a file, never a path.
    let stem: String = stem
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{}-{}.xlsx", stem, date.format("%Y-%m-%d"))
}

/// Render `table` to `.xlsx` bytes.
pub fn export_to_buffer(table: &Table, config: &ExportConfig) -> Result<Vec<u8>> {
    table.validate()?;
    render_workbook(&build_export_sheet(table), config)
}

/// Export `table` into `dir` under a dated name derived from `stem`.
/// Returns the path written.
pub fn export_to_path(
    table: &Table,
    dir: &Path,
    stem: &str,
    config: &ExportConfig,
) -> Result<PathBuf> {
    let buffer = export_to_buffer(table, config)?;
    let name = file_name_with_default(stem, &config.default_stem, Utc::now().date_naive());
    let target = dir.join(&name);
    let staging = dir.join(format!(".{}.partial", name));

    fs::write(&staging, &buffer)?;
    if let Err(err) = fs::rename(&staging, &target) {
        let _ = fs::remove_file(&staging);
        return Err(err.into());
    }

    info!(
        "exported {}x{} table to {}",
        table.grid.row_count(),
        table.grid.col_count(),
        target.display()
    );
    Ok(target)
}
