//! JSON table documents.
//!
//! Headers are stored as groups, `{ids, text}` per spanning header cell, so
//! a save followed by a load gives back the same table.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::document::{Grid, Headers, Table, TableCell};
use crate::error::Result;

/// On-disk shape of a table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDocument {
    pub headers: Headers,
    pub rows: Vec<Vec<TableCell>>,
}

impl From<&Table> for TableDocument {
    fn from(table: &Table) -> Self {
        TableDocument {
            headers: table.headers.clone(),
            rows: table.grid.rows().to_vec(),
        }
    }
}

impl TableDocument {
    /// Rebuild and validate the table.
    pub fn into_table(self) -> Result<Table> {
        let table = Table::new(self.headers, Grid::new(self.rows));
        table.validate()?;
        Ok(table)
    }
}

/// Parse a table from JSON text, rejecting inconsistent layouts.
pub fn read_table_content(content: &str) -> Result<Table> {
    let doc: TableDocument = serde_json::from_str(content)?;
    doc.into_table()
}

pub fn read_table(path: &Path) -> Result<Table> {
    let content = fs::read_to_string(path)?;
    read_table_content(&content)
}

pub fn write_table_content(table: &Table) -> Result<String> {
    Ok(serde_json::to_string_pretty(&TableDocument::from(table))?)
}

pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let content = write_table_content(table)?;
    fs::write(path, content + "\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TabelaError;
    use crate::document::{HeaderGroup, LayoutError};

    fn sample() -> Table {
        let table = Table::new(
            Headers::new(vec![
                HeaderGroup::new(vec![0, 1], "Nome"),
                HeaderGroup::new(vec![2], "Idade"),
            ]),
            Grid::from_values([["Ana", "", "=1+1"], ["Bia", "x", "30"]]),
        );
        table.merge_columns(0, 0, 1)
    }

    #[test]
    fn test_write_uses_header_groups_and_camel_case() {
        let json = write_table_content(&sample()).unwrap();
        assert!(json.contains("\"colSpan\": 2"));
        assert!(json.contains("\"merged\": true"));
        assert!(!json.contains("rowSpan"));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["headers"].as_array().unwrap().len(), 2);
        assert_eq!(value["headers"][0]["ids"], serde_json::json!([0, 1]));
        assert_eq!(value["headers"][0]["text"], "Nome");
    }

    #[test]
    fn test_adjacent_groups_with_same_text_survive_round_trip() {
        let table = Table::new(
            Headers::new(vec![HeaderGroup::new(vec![0], "A"), HeaderGroup::new(vec![1], "A")]),
            Grid::from_values([["1", "2"]]),
        );
        let back = read_table_content(&write_table_content(&table).unwrap()).unwrap();
        assert_eq!(back.headers.len(), 2);
        assert_eq!(back, table);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.json");
        let table = sample();
        write_table(&path, &table).unwrap();
        assert_eq!(read_table(&path).unwrap(), table);
    }

    #[test]
    fn test_read_rejects_width_mismatch() {
        let content = r#"{"headers":[{"ids":[0],"text":"A"}],"rows":[[{"value":"1"},{"value":"2"}]]}"#;
        let err = read_table_content(content).unwrap_err();
        assert!(matches!(
            err,
            TabelaError::Layout(LayoutError::WidthMismatch { .. })
        ));
    }

    #[test]
    fn test_read_rejects_orphan_merged_cell() {
        let content = r#"{"headers":[{"ids":[0,1],"text":"A"}],
            "rows":[[{"value":"1"},{"value":"","merged":true}]]}"#;
        assert!(matches!(
            read_table_content(content),
            Err(TabelaError::Layout(_))
        ));
    }

    #[test]
    fn test_read_rejects_huge_span() {
        let content = r#"{"headers":[{"ids":[0],"text":"A"}],
            "rows":[[{"value":"1"}],[{"value":"2","rowSpan":18446744073709551615}]]}"#;
        assert!(matches!(
            read_table_content(content),
            Err(TabelaError::Layout(LayoutError::SpanOutOfBounds { row: 1, col: 0 }))
        ));
    }

    #[test]
    fn test_read_rejects_flat_headers() {
        let content = r#"{"headers":[{"id":0,"text":"A"}],"rows":[[{"value":"1"}]]}"#;
        assert!(matches!(
            read_table_content(content),
            Err(TabelaError::Json(_))
        ));
    }

    #[test]
    fn test_read_reports_malformed_json() {
        assert!(matches!(
            read_table_content("{\"headers\":"),
            Err(TabelaError::Json(_))
        ));
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_table(&dir.path().join("missing.json")),
            Err(TabelaError::Io(_))
        ));
    }
}
