//! Circular dependency detection for formula cells.
//!
//! Before a formula is evaluated we verify that nothing reachable from it
//! refers back into the chain (e.g., A1 references B1, B1 references C1,
//! C1 references A1). This uses depth-first search over dependencies
//! extracted from the formulas currently stored in the sheet.

use std::collections::HashSet;

use super::{CellRef, Sheet, extract_dependencies};

/// Detect circular dependencies reachable from a cell.
/// Returns Some(cycle_path) if a cycle is found, None otherwise.
pub fn detect_cycle(start: &CellRef, sheet: &Sheet) -> Option<Vec<CellRef>> {
    let mut visiting = HashSet::new();
    let mut done = HashSet::new();
    let mut path = Vec::new();

    if detect_cycle_dfs(start, sheet, &mut visiting, &mut done, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn detect_cycle_dfs(
    current: &CellRef,
    sheet: &Sheet,
    visiting: &mut HashSet<CellRef>,
    done: &mut HashSet<CellRef>,
    path: &mut Vec<CellRef>,
) -> bool {
    if visiting.contains(current) {
        path.push(*current);
        return true;
    }
    if done.contains(current) {
        return false;
    }

    let deps = match sheet.get(current) {
        Some(entry) => match entry.value().formula() {
            Some(formula) => extract_dependencies(formula),
            None => return false,
        },
        None => return false,
    };

    visiting.insert(*current);
    path.push(*current);

    for dep in &deps {
        if detect_cycle_dfs(dep, sheet, visiting, done, path) {
            return true;
        }
    }

    path.pop();
    visiting.remove(current);
    done.insert(*current);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RawValue;
    use dashmap::DashMap;
    use std::sync::Arc;

    #[test]
    fn test_detects_indirect_cycle() {
        let sheet: Sheet = Arc::new(DashMap::new());
        sheet.insert(CellRef::new(0, 0), RawValue::from("=B1"));
        sheet.insert(CellRef::new(1, 0), RawValue::from("=C1"));
        sheet.insert(CellRef::new(2, 0), RawValue::from("=B1"));

        let path = detect_cycle(&CellRef::new(0, 0), &sheet).unwrap();
        assert_eq!(path.last(), Some(&CellRef::new(1, 0)));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let sheet: Sheet = Arc::new(DashMap::new());
        sheet.insert(CellRef::new(0, 0), RawValue::from("=B1 + C1"));
        sheet.insert(CellRef::new(1, 0), RawValue::from("=D1"));
        sheet.insert(CellRef::new(2, 0), RawValue::from("=D1"));
        sheet.insert(CellRef::new(3, 0), RawValue::from("5"));

        assert!(detect_cycle(&CellRef::new(0, 0), &sheet).is_none());
    }
}
