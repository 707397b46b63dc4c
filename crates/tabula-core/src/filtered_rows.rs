//! Row managers for derived tables.
//!
//! A derived (child) table holds a subset of a parent's rows. The
//! [`FilteredRowManager`] keeps the two-way association between child and
//! parent rows; the [`CascadedRowManager`] adds the column routing that lets
//! inherited columns read through to the parent.

use std::collections::BTreeMap;

use crate::row_manager::{Row, RowManager};
use crate::tuple::TupleSet;

/// Row manager with a child ↔ parent row mapping.
///
/// For every occupied child row `c`, `child_row(parent_row(c)) == Some(c)`.
#[derive(Debug, Clone, Default)]
pub struct FilteredRowManager {
    rows: RowManager,
    child_to_parent: Vec<Option<Row>>,
    parent_to_child: BTreeMap<Row, Row>,
}

impl FilteredRowManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Underlying slot manager.
    #[must_use]
    pub fn manager(&self) -> &RowManager {
        &self.rows
    }

    /// Number of child rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.row_count()
    }

    /// Returns true if `row` is an occupied child row.
    #[must_use]
    pub fn is_valid_row(&self, row: Row) -> bool {
        self.rows.is_valid_row(row)
    }

    /// Allocates a child row for `parent`.
    ///
    /// A parent that is already mapped keeps its existing child row.
    pub fn add_row(&mut self, parent: Row) -> Row {
        if let Some(&child) = self.parent_to_child.get(&parent) {
            return child;
        }
        let child = self.rows.add_row();
        self.put(child, parent);
        child
    }

    /// Associates an occupied child row with `parent`, replacing any
    /// previous association of either row.
    ///
    /// Returns false, leaving the mapping untouched, if `child` is not an
    /// occupied row of this manager.
    pub fn put(&mut self, child: Row, parent: Row) -> bool {
        if !self.rows.is_valid_row(child) {
            return false;
        }
        let Ok(slot) = usize::try_from(child) else {
            return false;
        };
        if self.child_to_parent.len() <= slot {
            self.child_to_parent.resize(slot + 1, None);
        }
        if let Some(old_parent) = self.child_to_parent[slot].replace(parent) {
            self.parent_to_child.remove(&old_parent);
        }
        if let Some(old_child) = self.parent_to_child.insert(parent, child) {
            if old_child != child {
                if let Some(entry) = usize::try_from(old_child)
                    .ok()
                    .and_then(|i| self.child_to_parent.get_mut(i))
                {
                    *entry = None;
                }
            }
        }
        true
    }

    /// Parent row of a child row.
    #[must_use]
    pub fn parent_row(&self, child: Row) -> Option<Row> {
        if !self.rows.is_valid_row(child) {
            return None;
        }
        usize::try_from(child)
            .ok()
            .and_then(|slot| self.child_to_parent.get(slot).copied().flatten())
    }

    /// Child row mapped to a parent row.
    #[must_use]
    pub fn child_row(&self, parent: Row) -> Option<Row> {
        self.parent_to_child.get(&parent).copied()
    }

    /// Releases a child row and both directions of its mapping.
    pub fn release_row(&mut self, child: Row) -> bool {
        if !self.rows.release_row(child) {
            return false;
        }
        if let Some(parent) = usize::try_from(child)
            .ok()
            .and_then(|slot| self.child_to_parent.get_mut(slot))
            .and_then(Option::take)
        {
            self.parent_to_child.remove(&parent);
        }
        true
    }

    /// Mapped parent rows in ascending parent order.
    pub fn parent_rows(&self) -> impl Iterator<Item = Row> + '_ {
        self.parent_to_child.keys().copied()
    }

    /// Releases every row and mapping.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.child_to_parent.clear();
        self.parent_to_child.clear();
    }
}

/// Where a column of a derived table takes its values from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    /// Stored in the derived table itself, at this local position.
    Local(usize),
    /// Read through to this column of the parent.
    Inherited(usize),
}

/// Filtered row manager that routes inherited columns to the parent.
#[derive(Debug, Clone, Default)]
pub struct CascadedRowManager {
    filtered: FilteredRowManager,
    sources: Vec<ColumnSource>,
    local_count: usize,
}

impl CascadedRowManager {
    /// Creates an empty manager with no columns.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Row mapping.
    #[must_use]
    pub fn filtered(&self) -> &FilteredRowManager {
        &self.filtered
    }

    /// Mutable row mapping.
    pub fn filtered_mut(&mut self) -> &mut FilteredRowManager {
        &mut self.filtered
    }

    /// Appends a column read through to `parent_col`; returns its position.
    pub fn push_inherited(&mut self, parent_col: usize) -> usize {
        self.sources.push(ColumnSource::Inherited(parent_col));
        self.sources.len() - 1
    }

    /// Appends a local column; returns its position.
    pub fn push_local(&mut self) -> usize {
        self.sources.push(ColumnSource::Local(self.local_count));
        self.local_count += 1;
        self.sources.len() - 1
    }

    /// Source of column `col`.
    #[must_use]
    pub fn source(&self, col: usize) -> Option<ColumnSource> {
        self.sources.get(col).copied()
    }

    /// Number of columns, local and inherited.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.sources.len()
    }

    /// Storage row holding the value of `col` for child row `row`.
    ///
    /// Local columns answer with the row itself. Inherited columns ask the
    /// parent, which may itself be a derived table.
    #[must_use]
    pub fn column_row(&self, row: Row, col: usize, parent: &dyn TupleSet) -> Option<Row> {
        if !self.filtered.is_valid_row(row) {
            return None;
        }
        match self.source(col)? {
            ColumnSource::Local(_) => Some(row),
            ColumnSource::Inherited(parent_col) => {
                parent.column_row(self.filtered.parent_row(row)?, parent_col)
            }
        }
    }

    /// Child row whose `col` value lives in storage row `column_row`.
    #[must_use]
    pub fn table_row(&self, column_row: Row, col: usize, parent: &dyn TupleSet) -> Option<Row> {
        match self.source(col)? {
            ColumnSource::Local(_) => self.filtered.is_valid_row(column_row).then_some(column_row),
            ColumnSource::Inherited(parent_col) => {
                self.filtered.child_row(parent.table_row(column_row, parent_col)?)
            }
        }
    }
}
