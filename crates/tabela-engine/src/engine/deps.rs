//! Dependency extraction from formula strings.
//!
//! Parses formula text to find all cell references (e.g., `A1`, `B2:C5`)
//! that the formula depends on. This is used for cycle detection before a
//! formula is evaluated.
//!
//! Handles:
//! - Simple cell references: `A1`, `B2`
//! - Range references in functions: `SUM(A1:B5)`
//! - Ignores references inside string literals

use super::cell_ref::CellRef;
use super::preprocess::{cell_token_re, followed_by_call};

const MAX_DEPENDENCY_RANGE_CELLS: usize = 1_000_000;

/// Extract all cell references from a formula (without the leading `=`).
pub fn extract_dependencies(formula: &str) -> Vec<CellRef> {
    let mut deps = Vec::new();

    // Blank out string literals so their contents are never read as references.
    let formula = strip_string_literals(formula);

    let range_re = crate::builtins::range_fn_re();
    for caps in range_re.captures_iter(&formula) {
        if let (Some(start), Some(end)) = (CellRef::from_str(&caps[2]), CellRef::from_str(&caps[3]))
        {
            deps.extend(expand_range(start, end));
        }
    }

    let without_ranges = range_re.replace_all(&formula, "").to_string();
    for caps in cell_token_re().captures_iter(&without_ranges) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if followed_by_call(&without_ranges, whole.end()) {
            continue;
        }
        if let Some(cr) = CellRef::from_str(&format!("{}{}", &caps[1], &caps[2])) {
            deps.push(cr);
        }
    }

    deps.sort();
    deps.dedup();
    deps
}

/// All cells in the rectangle spanned by two corners, or none when the
/// rectangle holds more than `MAX_DEPENDENCY_RANGE_CELLS` cells.
fn expand_range(start: CellRef, end: CellRef) -> Vec<CellRef> {
    let (min_row, max_row) = (start.row.min(end.row), start.row.max(end.row));
    let (min_col, max_col) = (start.col.min(end.col), start.col.max(end.col));

    let row_count = max_row - min_row + 1;
    let col_count = max_col - min_col + 1;
    match row_count.checked_mul(col_count) {
        Some(count) if count <= MAX_DEPENDENCY_RANGE_CELLS => {}
        _ => return Vec::new(),
    }

    let mut cells = Vec::with_capacity(row_count * col_count);
    for row in min_row..=max_row {
        for col in min_col..=max_col {
            cells.push(CellRef::new(col, row));
        }
    }
    cells
}

fn strip_string_literals(script: &str) -> String {
    let mut out = String::with_capacity(script.len());
    let mut in_string = false;
    let mut escaped = false;
    for ch in script.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
                out.push('"');
            }
            continue;
        }
        if ch == '"' {
            in_string = true;
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_and_range_dependencies() {
        let deps = extract_dependencies("A1 + SUM(B1:B2)");
        assert_eq!(
            deps,
            vec![CellRef::new(0, 0), CellRef::new(1, 0), CellRef::new(1, 1)]
        );
    }

    #[test]
    fn test_extract_ignores_string_literals_and_function_names() {
        let deps = extract_dependencies(r#"IF(LOG10(C3) > 1, "A1", "B2")"#);
        assert_eq!(deps, vec![CellRef::new(2, 2)]);
    }

    #[test]
    fn test_range_corners_in_any_order() {
        let deps = extract_dependencies("SUM(B2:A1)");
        assert_eq!(deps.len(), 4);
        assert_eq!(deps[0], CellRef::new(0, 0));
    }

    #[test]
    fn test_oversized_range_adds_no_dependencies() {
        assert!(extract_dependencies("SUM(A1:ZZ2000)").is_empty());
    }
}
