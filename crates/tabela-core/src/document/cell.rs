use serde::{Deserialize, Serialize};

/// One cell of the grid matrix.
///
/// A cell is either plain, a merge *master* (`row_span`/`col_span` > 1, not
/// merged) anchoring a rectangular region, or a merge *slave* (`merged`)
/// covered by some master's region. Slaves never carry spans.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    /// Raw user input. A leading `=` marks a formula.
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_span: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col_span: Option<usize>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub merged: bool,
    /// Last evaluated result; derived from `value`, never authoritative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_value: Option<String>,
}

impl TableCell {
    pub fn new(value: impl Into<String>) -> Self {
        TableCell {
            value: value.into(),
            ..Default::default()
        }
    }

    /// Effective `(row_span, col_span)`, defaulting to 1.
    pub fn span(&self) -> (usize, usize) {
        (self.row_span.unwrap_or(1), self.col_span.unwrap_or(1))
    }

    pub fn is_master(&self) -> bool {
        let (rows, cols) = self.span();
        !self.merged && (rows > 1 || cols > 1)
    }

    pub fn has_merge_state(&self) -> bool {
        self.merged || self.row_span.is_some() || self.col_span.is_some()
    }

    /// Drop all merge state (master spans and slave marker).
    pub fn clear_merge(&mut self) {
        self.merged = false;
        self.row_span = None;
        self.col_span = None;
    }

    pub fn is_formula(&self) -> bool {
        self.value.starts_with('=')
    }

    /// Formula body without the leading `=`.
    pub fn formula(&self) -> Option<&str> {
        self.value.strip_prefix('=')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_master_detection() {
        let mut cell = TableCell::new("x");
        assert!(!cell.is_master());
        cell.col_span = Some(2);
        assert!(cell.is_master());
        cell.merged = true;
        assert!(!cell.is_master());
        cell.clear_merge();
        assert!(!cell.has_merge_state());
        assert_eq!(cell.value, "x");
    }

    #[test]
    fn test_serializes_camel_case_and_skips_defaults() {
        let mut cell = TableCell::new("=A1");
        cell.row_span = Some(2);
        let json = serde_json::to_string(&cell).unwrap();
        assert_eq!(json, r#"{"value":"=A1","rowSpan":2}"#);

        let parsed: TableCell = serde_json::from_str(r#"{"value":"","merged":true}"#).unwrap();
        assert!(parsed.merged);
        assert_eq!(parsed.span(), (1, 1));
    }
}
