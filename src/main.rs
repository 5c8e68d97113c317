//! Tabela - tables with grouped headers and merged cells, exported to Excel.

mod commands;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;
use tabela_core::{CellRef, ColumnSide, RowSide};

use commands::{CellRange, parse_column, parse_ordinal};

/// Edit table documents and export them as .xlsx workbooks
#[derive(Parser, Debug)]
#[command(name = "tabela", version)]
struct Cli {
    /// Print debug logging to stderr (RUST_LOG overrides the level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a blank table (dimensions are clamped to 1..=200)
    New {
        file: PathBuf,
        #[arg(long, default_value_t = 3)]
        rows: usize,
        #[arg(long, default_value_t = 3)]
        cols: usize,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print headers and evaluated cells, tab separated
    Show { file: PathBuf },
    /// Set a cell value; a leading `=` makes it a formula
    Set {
        file: PathBuf,
        cell: CellRef,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Merge header groups START..=END (numbered from 1)
    HeaderMerge {
        file: PathBuf,
        #[arg(value_parser = parse_ordinal)]
        start: usize,
        #[arg(value_parser = parse_ordinal)]
        end: usize,
    },
    /// Rename a header group (numbered from 1)
    HeaderText {
        file: PathBuf,
        #[arg(value_parser = parse_ordinal)]
        group: usize,
        text: String,
    },
    /// Merge a rectangle of cells, e.g. `A1:B2`
    Merge { file: PathBuf, range: CellRange },
    /// Insert an empty row above (or below) ROW
    InsertRow {
        file: PathBuf,
        #[arg(value_parser = parse_ordinal)]
        row: usize,
        #[arg(long)]
        below: bool,
    },
    RemoveRow {
        file: PathBuf,
        #[arg(value_parser = parse_ordinal)]
        row: usize,
    },
    /// Insert an empty column left (or right) of COL, e.g. `B`
    InsertCol {
        file: PathBuf,
        #[arg(value_parser = parse_column)]
        col: usize,
        #[arg(long)]
        right: bool,
    },
    RemoveCol {
        file: PathBuf,
        #[arg(value_parser = parse_column)]
        col: usize,
    },
    /// Print the evaluated value of one cell
    Eval { file: PathBuf, cell: CellRef },
    /// Write the table as `<stem>-<date>.xlsx`
    Export {
        file: PathBuf,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// File name stem (defaults to the configured one)
        #[arg(long, default_value = "")]
        stem: String,
        /// Export settings (defaults to the per-user config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .parse_default_env()
        .format_timestamp(None)
        .init();

    match cli.command {
        Command::New {
            file,
            rows,
            cols,
            force,
        } => commands::new_table(&file, rows, cols, force),
        Command::Show { file } => commands::show(&file),
        Command::Set { file, cell, value } => {
            commands::edit(&file, |t| t.update_cell(cell.row, cell.col, value.as_str()))
        }
        Command::HeaderMerge { file, start, end } => {
            commands::edit(&file, |t| t.merge_headers(start, end))
        }
        Command::HeaderText { file, group, text } => {
            commands::edit(&file, |t| t.set_header_text(group, text.as_str()))
        }
        Command::Merge { file, range } => commands::edit(&file, |t| {
            t.merge_block(range.start.row, range.end.row, range.start.col, range.end.col)
        }),
        Command::InsertRow { file, row, below } => {
            let side = if below { RowSide::Below } else { RowSide::Above };
            commands::edit(&file, |t| t.insert_row(row, side))
        }
        Command::RemoveRow { file, row } => commands::edit(&file, |t| t.remove_row(row)),
        Command::InsertCol { file, col, right } => {
            let side = if right {
                ColumnSide::Right
            } else {
                ColumnSide::Left
            };
            commands::edit(&file, |t| t.insert_column(col, side))
        }
        Command::RemoveCol { file, col } => commands::edit(&file, |t| t.remove_column(col)),
        Command::Eval { file, cell } => commands::eval(&file, cell),
        Command::Export {
            file,
            out_dir,
            stem,
            config,
        } => commands::export(&file, &out_dir, &stem, config.as_deref()),
    }
}
