//! Subcommand implementations. Every edit loads the table, applies one
//! transform, refreshes formula displays and writes the file back.

use anyhow::{Context, Result, bail};
use log::{debug, warn};
use std::path::Path;
use std::str::FromStr;

use tabela_core::config::load_config;
use tabela_core::export::export_to_path;
use tabela_core::formula::FormulaSession;
use tabela_core::storage::{read_table, write_table};
use tabela_core::{CellRef, RhaiEngine, Table};

/// Inclusive rectangle given as `A1:B2` (or a single cell).
#[derive(Clone, Copy, Debug)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl FromStr for CellRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s.split_once(':').unwrap_or((s, s));
        Ok(CellRange {
            start: a.parse()?,
            end: b.parse()?,
        })
    }
}

/// Parse a 1-based number into a 0-based index.
pub fn parse_ordinal(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("expected a number starting at 1, got '{}'", s)),
    }
}

/// Parse column letters (`A`, `AB`) into a 0-based index.
pub fn parse_column(s: &str) -> Result<usize, String> {
    CellRef::letters_to_col(s.trim()).ok_or_else(|| format!("invalid column letters '{}'", s))
}

fn load(file: &Path) -> Result<Table> {
    read_table(file).with_context(|| format!("failed to read {}", file.display()))
}

fn save(file: &Path, table: &Table) -> Result<()> {
    write_table(file, table).with_context(|| format!("failed to write {}", file.display()))
}

/// Recompute every formula's display value.
fn refresh(table: Table) -> Table {
    let mut session = FormulaSession::new(RhaiEngine::new());
    let grid = session.evaluate_all(&table.grid);
    Table { grid, ..table }
}

pub fn new_table(file: &Path, rows: usize, cols: usize, force: bool) -> Result<()> {
    if file.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", file.display());
    }
    let table = Table::new_empty(rows, cols);
    save(file, &table)?;
    println!(
        "Created {}x{} table in {}",
        table.grid.row_count(),
        table.grid.col_count(),
        file.display()
    );
    Ok(())
}

pub fn edit(file: &Path, op: impl FnOnce(&Table) -> Table) -> Result<()> {
    let table = load(file)?;
    let next = op(&table);
    if next == table {
        debug!("{}: nothing to change", file.display());
    }
    save(file, &refresh(next))
}

fn header_line(table: &Table) -> Vec<String> {
    let mut line = Vec::new();
    for group in &table.headers {
        line.push(group.text.clone());
        line.extend(std::iter::repeat_n(String::new(), group.span().saturating_sub(1)));
    }
    line
}

pub fn show(file: &Path) -> Result<()> {
    let table = refresh(load(file)?);
    println!("{}", header_line(&table).join("\t"));
    for row in table.grid.rows() {
        let cells: Vec<&str> = row
            .iter()
            .map(|cell| {
                if cell.merged {
                    ""
                } else if cell.is_formula() {
                    cell.display_value.as_deref().unwrap_or("")
                } else {
                    cell.value.as_str()
                }
            })
            .collect();
        println!("{}", cells.join("\t"));
    }
    Ok(())
}

pub fn eval(file: &Path, cell: CellRef) -> Result<()> {
    let table = load(file)?;
    if table.grid.get(cell.row, cell.col).is_none() {
        bail!("{} is outside the table", cell);
    }
    let mut session = FormulaSession::new(RhaiEngine::new());
    let (_, display) = session.evaluate(&table.grid, cell.row, cell.col);
    println!("{}", display);
    Ok(())
}

pub fn export(file: &Path, out_dir: &Path, stem: &str, config_file: Option<&Path>) -> Result<()> {
    let (config, warnings) = load_config(config_file);
    for warning in warnings {
        warn!("{}", warning);
    }
    let table = load(file)?;
    let path = export_to_path(&table, out_dir, stem, &config)
        .with_context(|| format!("failed to export {}", file.display()))?;
    println!("Exported to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        let range: CellRange = "A1:C2".parse().unwrap();
        assert_eq!((range.start.row, range.start.col), (0, 0));
        assert_eq!((range.end.row, range.end.col), (1, 2));
        let single: CellRange = "B3".parse().unwrap();
        assert_eq!(single.start, single.end);
        assert!("A1:".parse::<CellRange>().is_err());
    }

    #[test]
    fn test_parse_ordinal_and_column() {
        assert_eq!(parse_ordinal("1"), Ok(0));
        assert!(parse_ordinal("0").is_err());
        assert_eq!(parse_column("b"), Ok(1));
        assert_eq!(parse_column("AA"), Ok(26));
        assert!(parse_column("1").is_err());
    }

    #[test]
    fn test_header_line_pads_spans() {
        let table = Table::new_empty(1, 3);
        assert_eq!(header_line(&table), vec!["Grupo 1", "", ""]);
    }
}
