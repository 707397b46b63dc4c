//! Detached row iteration with a concurrent-modification tripwire.

use crate::error::{Error, Result};
use crate::row_manager::{Row, RowCursor};
use crate::table::Table;
use crate::tuple::TupleSet;
use crate::value::Value;

/// Walks the rows of a [`Table`] without borrowing it.
///
/// The iterator records the table's modification count. Changes made
/// through the iterator itself ([`remove`](Self::remove),
/// [`set`](Self::set)) refresh that record; any other change makes the
/// next call fail with [`Error::ConcurrentModification`].
#[derive(Debug, Clone)]
pub struct TableIterator {
    cursor: RowCursor,
    expected: u64,
    current: Option<Row>,
}

impl TableIterator {
    /// Iterates `table` in ascending row order.
    #[must_use]
    pub fn new(table: &Table) -> Self {
        Self::with_order(table, false)
    }

    /// Iterates `table` in ascending or descending row order.
    #[must_use]
    pub fn with_order(table: &Table, reverse: bool) -> Self {
        Self {
            cursor: table.row_manager().cursor(reverse),
            expected: table.modification_count(),
            current: None,
        }
    }

    /// Row most recently returned by [`next_row`](Self::next_row).
    #[must_use]
    pub fn current(&self) -> Option<Row> {
        self.current
    }

    fn check(&self, table: &Table) -> Result<()> {
        let actual = table.modification_count();
        if actual == self.expected {
            Ok(())
        } else {
            Err(Error::ConcurrentModification {
                expected: self.expected,
                actual,
            })
        }
    }

    fn current_row(&self) -> Result<Row> {
        self.current.ok_or(Error::InvalidRow(-1))
    }

    /// Advances to the next valid row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConcurrentModification`] if the table changed
    /// behind the iterator.
    pub fn next_row(&mut self, table: &Table) -> Result<Option<Row>> {
        self.check(table)?;
        self.current = self.cursor.advance(table.row_manager());
        Ok(self.current)
    }

    /// Reads `column` of the current row.
    ///
    /// # Errors
    ///
    /// Fails on a concurrent modification, before the first row, or for an
    /// unknown column.
    pub fn get(&self, table: &Table, column: &str) -> Result<Value> {
        self.check(table)?;
        table.get(self.current_row()?, column)
    }

    /// Writes `column` of the current row, returning the previous value.
    ///
    /// # Errors
    ///
    /// Fails on a concurrent modification, before the first row, or when
    /// the table rejects the value.
    pub fn set(&mut self, table: &mut Table, column: &str, value: impl Into<Value>) -> Result<Value> {
        self.check(table)?;
        let previous = table.set(self.current_row()?, column, value)?;
        self.expected = table.modification_count();
        Ok(previous)
    }

    /// Removes the current row. Iteration continues with the next row.
    ///
    /// # Errors
    ///
    /// Fails on a concurrent modification or before the first row.
    pub fn remove(&mut self, table: &mut Table) -> Result<bool> {
        self.check(table)?;
        let row = self.current_row()?;
        let removed = table.remove_row(row);
        self.current = None;
        self.expected = table.modification_count();
        Ok(removed)
    }
}
