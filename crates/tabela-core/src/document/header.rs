//! Header group model.
//!
//! Header groups partition the column positions of the grid: concatenating
//! every group's `ids` in order yields one id per column, with no gaps and no
//! duplicates. A group's span is the number of ids it owns.

use log::debug;
use serde::{Deserialize, Serialize};

use super::ColumnSide;

/// Stable identifier of an original column slot.
pub type ColumnId = u64;

/// A named run of adjacent columns rendered as one spanning header cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderGroup {
    pub ids: Vec<ColumnId>,
    pub text: String,
}

impl HeaderGroup {
    pub fn new(ids: Vec<ColumnId>, text: impl Into<String>) -> Self {
        HeaderGroup {
            ids,
            text: text.into(),
        }
    }

    pub fn span(&self) -> usize {
        self.ids.len()
    }
}

/// Position of an absolute column inside the header groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnLocation {
    pub group_index: usize,
    pub offset: usize,
    /// Absolute index of the group's first column.
    pub group_start: usize,
}

/// One `(column id, text)` entry of the flattened header list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatHeader {
    pub id: ColumnId,
    pub text: String,
}

/// Ordered list of header groups.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(Vec<HeaderGroup>);

impl Headers {
    pub fn new(groups: Vec<HeaderGroup>) -> Self {
        Headers(groups)
    }

    /// One group spanning `columns` columns with ids `0..columns`.
    pub fn single(columns: usize, text: impl Into<String>) -> Self {
        if columns == 0 {
            return Headers::default();
        }
        Headers(vec![HeaderGroup::new(
            (0..columns as ColumnId).collect(),
            text,
        )])
    }

    pub fn groups(&self) -> &[HeaderGroup] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HeaderGroup> {
        self.0.iter()
    }

    /// Column ids in column order.
    pub fn column_ids(&self) -> impl Iterator<Item = ColumnId> + '_ {
        self.0.iter().flat_map(|g| g.ids.iter().copied())
    }

    /// Total number of columns (sum of group spans).
    pub fn total_columns(&self) -> usize {
        self.0.iter().map(HeaderGroup::span).sum()
    }

    /// Map an absolute column index to its owning group and in-group offset.
    pub fn locate(&self, col: usize) -> Option<ColumnLocation> {
        let mut acc = 0;
        for (group_index, group) in self.0.iter().enumerate() {
            let len = group.span();
            if col < acc + len {
                return Some(ColumnLocation {
                    group_index,
                    offset: col - acc,
                    group_start: acc,
                });
            }
            acc += len;
        }
        None
    }

    /// Replace groups `start..=end` with a single group.
    ///
    /// The merged group owns the sorted union of the member ids; its text
    /// joins the non-empty member texts with `/`.
    pub fn merge_adjacent(&self, start: usize, end: usize) -> Self {
        if start >= end || end >= self.0.len() {
            debug!("merge_adjacent({}, {}) ignored", start, end);
            return self.clone();
        }

        let members = &self.0[start..=end];
        let mut ids: Vec<ColumnId> = members.iter().flat_map(|g| g.ids.iter().copied()).collect();
        ids.sort_unstable();
        let text = members
            .iter()
            .map(|g| g.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("/");

        let mut groups = Vec::with_capacity(self.0.len() - (end - start));
        groups.extend_from_slice(&self.0[..start]);
        groups.push(HeaderGroup::new(ids, text));
        groups.extend_from_slice(&self.0[end + 1..]);
        Headers(groups)
    }

    /// Drag-and-drop gesture: dropping group `from` onto group `to` merges the
    /// whole range between them.
    pub fn move_header(&self, from: usize, to: usize) -> Self {
        self.merge_adjacent(from.min(to), from.max(to))
    }

    /// Replace the label of one group.
    pub fn set_group_text(&self, index: usize, text: impl Into<String>) -> Self {
        if index >= self.0.len() {
            debug!("set_group_text({}) out of range", index);
            return self.clone();
        }
        let mut groups = self.0.clone();
        groups[index].text = text.into();
        Headers(groups)
    }

    /// Id that no existing column uses.
    pub fn next_column_id(&self) -> ColumnId {
        self.column_ids().max().map_or(0, |max| max + 1)
    }

    /// Insert a fresh column id next to absolute column `col`.
    ///
    /// The id joins the group owning that boundary, extending its span; a
    /// boundary between two groups belongs to the left one. Past the last
    /// column the id is appended to the last group, and a first group is
    /// created when there are none.
    pub fn insert_column(&self, col: usize, side: ColumnSide) -> Self {
        let total = self.total_columns();
        if total > 0 && col >= total {
            debug!("insert_column({}) out of range", col);
            return self.clone();
        }

        let new_id = self.next_column_id();
        let mut groups = self.0.clone();
        let Some(last) = groups.len().checked_sub(1) else {
            return Headers(vec![HeaderGroup::new(vec![new_id], "")]);
        };

        let target = match side {
            ColumnSide::Left => col,
            ColumnSide::Right => col + 1,
        };
        let mut acc = 0;
        for group in groups.iter_mut() {
            let len = group.span();
            if target <= acc + len {
                group.ids.insert(target - acc, new_id);
                return Headers(groups);
            }
            acc += len;
        }
        groups[last].ids.push(new_id);
        Headers(groups)
    }

    /// Remove the id at absolute column `col`, dropping its group if emptied.
    pub fn remove_column(&self, col: usize) -> Self {
        let Some(loc) = self.locate(col) else {
            debug!("remove_column({}) out of range", col);
            return self.clone();
        };
        let mut groups = self.0.clone();
        groups[loc.group_index].ids.remove(loc.offset);
        if groups[loc.group_index].ids.is_empty() {
            groups.remove(loc.group_index);
        }
        Headers(groups)
    }

    /// Flatten to one `(id, text)` entry per column.
    pub fn flatten(&self) -> Vec<FlatHeader> {
        self.0
            .iter()
            .flat_map(|g| {
                g.ids.iter().map(|&id| FlatHeader {
                    id,
                    text: g.text.clone(),
                })
            })
            .collect()
    }

    /// Rebuild groups from a flattened list by joining consecutive entries
    /// that share the same text.
    pub fn regroup(flat: &[FlatHeader]) -> Self {
        let mut groups: Vec<HeaderGroup> = Vec::new();
        for entry in flat {
            match groups.last_mut() {
                Some(group) if group.text == entry.text => group.ids.push(entry.id),
                _ => groups.push(HeaderGroup::new(vec![entry.id], entry.text.clone())),
            }
        }
        Headers(groups)
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a HeaderGroup;
    type IntoIter = std::slice::Iter<'a, HeaderGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
