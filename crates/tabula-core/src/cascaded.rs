//! Filtered, projected views over a parent tuple set.
//!
//! A [`CascadedTable`] keeps the parent rows that satisfy its filter and
//! exposes a subset of the parent's columns next to columns of its own.
//! The parent is passed in explicitly wherever it is needed, so a view can
//! sit on a [`Table`](crate::Table) or on another bound view.
//!
//! ```text
//! Table ──filter_rows──> CascadedTable ──bind──> CascadedView (TupleSet)
//!                                                     │
//!                                   CascadedTable ────┘ (next level)
//! ```

use std::collections::BTreeSet;

use tracing::debug;

use crate::column::{ColumnData, Schema};
use crate::error::{Error, Result};
use crate::event::{ColumnScope, EventKind, TableEvent};
use crate::expression::Expression;
use crate::filtered_rows::{CascadedRowManager, ColumnSource};
use crate::row_manager::Row;
use crate::tuple::{RowIter, TupleSet};
use crate::value::{ColumnType, Value};

/// Parent columns a derived table exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Projection {
    /// Every parent column, in parent order.
    #[default]
    All,
    /// The named parent columns, in the given order.
    Columns(Vec<String>),
}

impl Projection {
    /// Projection of the named columns.
    #[must_use]
    pub fn columns<S: AsRef<str>>(names: &[S]) -> Self {
        Self::Columns(names.iter().map(|n| n.as_ref().to_string()).collect())
    }
}

/// A derived table holding the parent rows accepted by a filter.
#[derive(Debug, Clone)]
pub struct CascadedTable {
    rows: CascadedRowManager,
    schema: Schema,
    local: Vec<ColumnData>,
    filter: Option<Expression>,
    modifications: u64,
}

impl CascadedTable {
    /// Creates a view of `parent` and populates it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] if the projection names a column
    /// the parent does not have.
    pub fn new(
        parent: &dyn TupleSet,
        filter: Option<Expression>,
        projection: &Projection,
    ) -> Result<Self> {
        let mut rows = CascadedRowManager::new();
        let mut schema = Schema::new();
        let parent_columns: Vec<usize> = match projection {
            Projection::All => (0..parent.column_count()).collect(),
            Projection::Columns(names) => names
                .iter()
                .map(|name| {
                    parent
                        .column_index(name)
                        .ok_or_else(|| Error::ColumnNotFound(name.clone()))
                })
                .collect::<Result<_>>()?,
        };
        for parent_col in parent_columns {
            let (Some(name), Some(ty)) = (parent.column_name(parent_col), parent.column_type(parent_col))
            else {
                return Err(Error::ColumnNotFound(format!("#{parent_col}")));
            };
            schema.add(name, ty)?;
            rows.push_inherited(parent_col);
        }

        let mut table = Self {
            rows,
            schema,
            local: Vec::new(),
            filter,
            modifications: 0,
        };
        table.filter_rows(parent);
        Ok(table)
    }

    /// Row filter, if any.
    #[must_use]
    pub fn filter(&self) -> Option<&Expression> {
        self.filter.as_ref()
    }

    /// Replaces the row filter and re-filters against `parent`.
    pub fn set_filter(&mut self, parent: &dyn TupleSet, filter: Option<Expression>) {
        self.filter = filter;
        self.filter_rows(parent);
    }

    /// Column schema, inherited columns first.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Row and column routing.
    #[must_use]
    pub fn row_manager(&self) -> &CascadedRowManager {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.filtered().row_count()
    }

    /// Parent row behind a child row.
    #[must_use]
    pub fn parent_row(&self, row: Row) -> Option<Row> {
        self.rows.filtered().parent_row(row)
    }

    /// Child row showing a parent row.
    #[must_use]
    pub fn child_row(&self, parent_row: Row) -> Option<Row> {
        self.rows.filtered().child_row(parent_row)
    }

    fn accepts(&self, parent: &dyn TupleSet, row: Row) -> bool {
        parent.is_valid_row(row)
            && self
                .filter
                .as_ref()
                .is_none_or(|filter| filter.matches_row(parent, row))
    }

    fn include(&mut self, parent_row: Row) -> bool {
        if self.rows.filtered().child_row(parent_row).is_some() {
            return false;
        }
        let child = self.rows.filtered_mut().add_row(parent_row);
        let slots = usize::try_from(i64::from(child) + 1).unwrap_or(0);
        for column in &mut self.local {
            column.ensure_len(slots);
            column.reset(child);
        }
        true
    }

    fn exclude(&mut self, parent_row: Row) -> bool {
        let Some(child) = self.rows.filtered().child_row(parent_row) else {
            return false;
        };
        for column in &mut self.local {
            column.reset(child);
        }
        self.rows.filtered_mut().release_row(child)
    }

    /// Re-evaluates every parent row against the filter.
    ///
    /// Rows that still pass keep their child row and local values.
    pub fn filter_rows(&mut self, parent: &dyn TupleSet) {
        let accepted: BTreeSet<Row> = parent.rows().filter(|&row| self.accepts(parent, row)).collect();
        let stale: Vec<Row> = self
            .rows
            .filtered()
            .parent_rows()
            .filter(|row| !accepted.contains(row))
            .collect();

        let removed = stale.into_iter().filter(|&row| self.exclude(row)).count();
        let added = accepted.into_iter().filter(|&row| self.include(row)).count();
        self.modifications += 1;
        debug!(
            rows = self.row_count(),
            added,
            removed,
            "Filtered cascaded rows"
        );
    }

    /// Applies a change event of `parent` incrementally.
    ///
    /// Deletes must be delivered while the deleted rows are still valid in
    /// the parent, which is how [`Table`](crate::Table) fires them.
    pub fn parent_changed(&mut self, parent: &dyn TupleSet, event: &TableEvent) {
        let changed = match (event.kind, event.column) {
            (EventKind::Insert, _) => event
                .rows()
                .filter(|&row| self.accepts(parent, row) && self.include(row))
                .count(),
            (EventKind::Delete, _) => event.rows().filter(|&row| self.exclude(row)).count(),
            (EventKind::Update, scope) => {
                if !self.filter_reads(parent, scope) {
                    return;
                }
                event
                    .rows()
                    .filter(|&row| {
                        if self.accepts(parent, row) {
                            self.include(row)
                        } else {
                            self.exclude(row)
                        }
                    })
                    .count()
            }
        };
        if changed > 0 {
            self.modifications += 1;
        }
    }

    fn filter_reads(&self, parent: &dyn TupleSet, scope: ColumnScope) -> bool {
        let Some(filter) = &self.filter else {
            return false;
        };
        match scope {
            ColumnScope::All => true,
            ColumnScope::Column(col) => parent
                .column_name(col)
                .is_some_and(|name| filter.columns().contains(name)),
        }
    }

    /// Adds a column stored in this table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnExists`] if the name is taken.
    pub fn add_column(&mut self, name: &str, ty: ColumnType) -> Result<usize> {
        let col = self.schema.add(name, ty)?;
        self.rows.push_local();
        let mut data = ColumnData::new(ty);
        let max = self.rows.filtered().manager().maximum_row();
        data.ensure_len(usize::try_from(i64::from(max) + 1).unwrap_or(0));
        self.local.push(data);
        self.modifications += 1;
        Ok(col)
    }

    fn local_column(&self, name: &str) -> Result<usize> {
        let col = self
            .schema
            .index_of(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?;
        match self.rows.source(col) {
            Some(ColumnSource::Local(local)) => Ok(local),
            _ => Err(Error::ColumnNotFound(name.to_string())),
        }
    }

    /// Writes a local column, returning the previous value.
    ///
    /// Inherited columns are written through the parent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRow`], [`Error::ColumnNotFound`] when `column`
    /// is not a local column, or [`Error::TypeMismatch`].
    pub fn set(&mut self, row: Row, column: &str, value: impl Into<Value>) -> Result<Value> {
        let local = self.local_column(column)?;
        if !self.rows.filtered().is_valid_row(row) {
            return Err(Error::InvalidRow(row));
        }
        let previous = self.local[local].set(row, &value.into()).map_err(|err| match err {
            Error::TypeMismatch {
                expected, actual, ..
            } => Error::TypeMismatch {
                column: column.to_string(),
                expected,
                actual,
            },
            other => other,
        })?;
        self.modifications += 1;
        Ok(previous)
    }

    /// Read-only view of this table over `parent`.
    #[must_use]
    pub fn bind<'a>(&'a self, parent: &'a dyn TupleSet) -> CascadedView<'a> {
        CascadedView {
            table: self,
            parent,
        }
    }

    fn value(&self, parent: &dyn TupleSet, row: Row, col: usize) -> Option<Value> {
        if !self.rows.filtered().is_valid_row(row) {
            return None;
        }
        match self.rows.source(col)? {
            ColumnSource::Local(local) => self.local.get(local)?.get(row),
            ColumnSource::Inherited(parent_col) => parent.value(self.parent_row(row)?, parent_col),
        }
    }
}

/// A [`CascadedTable`] paired with its parent.
#[derive(Clone, Copy)]
pub struct CascadedView<'a> {
    table: &'a CascadedTable,
    parent: &'a dyn TupleSet,
}

impl<'a> CascadedView<'a> {
    /// The derived table.
    #[must_use]
    pub fn table(&self) -> &'a CascadedTable {
        self.table
    }

    /// The parent tuple set.
    #[must_use]
    pub fn parent(&self) -> &'a dyn TupleSet {
        self.parent
    }
}

impl TupleSet for CascadedView<'_> {
    fn row_count(&self) -> usize {
        self.table.row_count()
    }

    fn is_valid_row(&self, row: Row) -> bool {
        self.table.rows.filtered().is_valid_row(row)
    }

    fn rows(&self) -> RowIter<'_> {
        Box::new(self.table.rows.filtered().manager().rows())
    }

    fn rows_reversed(&self) -> RowIter<'_> {
        Box::new(self.table.rows.filtered().manager().rows_reversed())
    }

    fn column_count(&self) -> usize {
        self.table.schema.len()
    }

    fn column_name(&self, col: usize) -> Option<&str> {
        self.table.schema.name(col)
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.table.schema.index_of(name)
    }

    fn column_type(&self, col: usize) -> Option<ColumnType> {
        self.table.schema.column_type(col)
    }

    fn value(&self, row: Row, col: usize) -> Option<Value> {
        self.table.value(self.parent, row, col)
    }

    fn column_row(&self, row: Row, col: usize) -> Option<Row> {
        self.table.rows.column_row(row, col, self.parent)
    }

    fn table_row(&self, column_row: Row, col: usize) -> Option<Row> {
        self.table.rows.table_row(column_row, col, self.parent)
    }

    fn modification_count(&self) -> u64 {
        self.table.modifications
    }
}
