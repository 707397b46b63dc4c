//! Read-side table contract.
//!
//! [`TupleSet`] is what the planner, the indexes and the iteration utilities
//! consume. Base tables and cascaded views both implement it, which is what
//! lets views stack on top of views.

use std::fmt;

use crate::index::Index;
use crate::row_manager::Row;
use crate::value::{ColumnType, Value};

/// Boxed row iterator borrowed from a tuple set.
pub type RowIter<'a> = Box<dyn Iterator<Item = Row> + 'a>;

/// A set of rows over an ordered list of typed columns.
pub trait TupleSet {
    /// Number of valid rows.
    fn row_count(&self) -> usize;

    /// Returns true if `row` is a valid row.
    fn is_valid_row(&self, row: Row) -> bool;

    /// Valid rows in ascending order.
    fn rows(&self) -> RowIter<'_>;

    /// Valid rows in descending order.
    fn rows_reversed(&self) -> RowIter<'_>;

    /// Number of columns.
    fn column_count(&self) -> usize;

    /// Name of column `col`.
    fn column_name(&self, col: usize) -> Option<&str>;

    /// Position of the column called `name`.
    fn column_index(&self, name: &str) -> Option<usize>;

    /// Declared type of column `col`.
    fn column_type(&self, col: usize) -> Option<ColumnType>;

    /// Value of `col` in `row`, or `None` for an invalid row or column.
    fn value(&self, row: Row, col: usize) -> Option<Value>;

    /// Row of the backing storage holding the value of `col` for `row`.
    fn column_row(&self, row: Row, col: usize) -> Option<Row>;

    /// Inverse of [`column_row`](TupleSet::column_row).
    fn table_row(&self, column_row: Row, col: usize) -> Option<Row>;

    /// Index over the column called `name`, if one is maintained.
    fn index(&self, _name: &str) -> Option<&dyn Index> {
        None
    }

    /// Counter bumped by every structural or value mutation.
    fn modification_count(&self) -> u64 {
        0
    }

    /// Value of the column called `name` in `row`.
    fn value_by_name(&self, row: Row, name: &str) -> Option<Value> {
        self.value(row, self.column_index(name)?)
    }

    /// Tuple handle for `row`, if it is valid.
    fn tuple(&self, row: Row) -> Option<Tuple<'_>>
    where
        Self: Sized,
    {
        self.is_valid_row(row).then_some(Tuple { source: self, row })
    }
}

/// Handle to one row of a [`TupleSet`].
#[derive(Clone, Copy)]
pub struct Tuple<'a> {
    source: &'a dyn TupleSet,
    row: Row,
}

impl<'a> Tuple<'a> {
    /// Creates a handle without checking validity.
    #[must_use]
    pub fn new(source: &'a dyn TupleSet, row: Row) -> Self {
        Self { source, row }
    }

    /// Row id within the source.
    #[must_use]
    pub fn row(&self) -> Row {
        self.row
    }

    /// The tuple set this tuple belongs to.
    #[must_use]
    pub fn source(&self) -> &'a dyn TupleSet {
        self.source
    }

    /// Returns true while the row is still valid in its source.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.source.is_valid_row(self.row)
    }

    /// Value of the column called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.source.value_by_name(self.row, name)
    }

    /// Value of column `col`.
    #[must_use]
    pub fn get_at(&self, col: usize) -> Option<Value> {
        self.source.value(self.row, col)
    }
}

impl fmt::Debug for Tuple<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        map.entry(&"row", &self.row);
        for col in 0..self.source.column_count() {
            if let Some(name) = self.source.column_name(col) {
                map.entry(&name, &self.get_at(col));
            }
        }
        map.finish()
    }
}

impl PartialEq for Tuple<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.row == other.row
            && std::ptr::addr_eq(
                self.source as *const dyn TupleSet,
                other.source as *const dyn TupleSet,
            )
    }
}
