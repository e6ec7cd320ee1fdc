//! Per-view UI state: expanded cells and hidden rows.
//!
//! State is keyed by value so it survives re-fetches that rebuild the rows.

use std::collections::HashSet;

use crate::{ObjectId, SubjectId};

/// Identifies a cell in the main table of a specific table definition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub table: usize,
    pub row: usize,
    pub col: usize,
}

impl CellKey {
    pub const fn new(table: usize, row: usize, col: usize) -> Self {
        Self { table, row, col }
    }
}

/// Which list-valued cells currently show every value
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: HashSet<CellKey>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a cell; returns whether it is now expanded
    pub fn toggle(&mut self, key: CellKey) -> bool {
        if self.expanded.remove(&key) {
            false
        } else {
            self.expanded.insert(key);
            true
        }
    }

    pub fn is_expanded(&self, key: CellKey) -> bool {
        self.expanded.contains(&key)
    }

    /// Forget expansions belonging to one table
    pub fn clear_table(&mut self, table: usize) {
        self.expanded.retain(|k| k.table != table);
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}

/// A table row's identity: its subject and the objects it aggregates
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RowKey {
    pub subject: SubjectId,
    pub objects: Vec<ObjectId>,
}

impl RowKey {
    pub fn new(subject: SubjectId, objects: &[ObjectId]) -> Self {
        Self {
            subject,
            objects: objects.to_vec(),
        }
    }
}

/// Rows hidden from view; everything is visible by default
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibilityState {
    hidden: HashSet<RowKey>,
}

impl VisibilityState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self, key: &RowKey) -> bool {
        !self.hidden.contains(key)
    }

    pub fn set_visible(&mut self, key: RowKey, visible: bool) {
        if visible {
            self.hidden.remove(&key);
        } else {
            self.hidden.insert(key);
        }
    }

    /// Flip a row; returns whether it is now visible
    pub fn toggle(&mut self, key: RowKey) -> bool {
        let visible = !self.is_visible(&key);
        self.set_visible(key, visible);
        visible
    }

    pub fn show_all(&mut self) {
        self.hidden.clear();
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }
}
