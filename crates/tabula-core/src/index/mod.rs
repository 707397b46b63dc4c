//! Sorted column indexes.
//!
//! An [`Index`] keeps one column of one table in key order and answers
//! range, exact-match and order-statistic queries with row ids. The only
//! implementation is [`TreeIndex`], whose storage is one of six key
//! representations chosen from the column type.

mod sorted_rows;
mod tree;
mod types;

pub use sorted_rows::{KeyedRows, SortedRows};
pub use tree::TreeIndex;
pub use types::IndexType;

use crate::comparator::LiteralComparator;
use crate::row_manager::Row;
use crate::tuple::RowIter;
use crate::value::{ColumnType, Value};

/// Sorted index over one column.
///
/// The typed range scans must match the index's key representation. Calling
/// `rows_int` on a `Double` index, for instance, logs a warning and yields
/// no rows.
pub trait Index {
    /// Indexed column name.
    fn column(&self) -> &str;

    /// Indexed column type.
    fn column_type(&self) -> ColumnType;

    /// Comparator defining the key order.
    fn comparator(&self) -> LiteralComparator;

    /// Number of indexed rows.
    fn size(&self) -> usize;

    /// Number of distinct keys.
    fn unique_count(&self) -> usize;

    /// A row holding the smallest key.
    fn minimum(&self) -> Option<Row>;

    /// A row holding the largest key.
    fn maximum(&self) -> Option<Row>;

    /// The row in the middle of the key order.
    fn median(&self) -> Option<Row>;

    /// Every indexed row, in the direction given by `ty`.
    fn all_rows(&self, ty: IndexType) -> RowIter<'_>;

    /// Rows with `i32` keys between `lo` and `hi`.
    /// Yields nothing unless the index has `Int` keys.
    fn rows_int(&self, lo: i32, hi: i32, ty: IndexType) -> RowIter<'_>;

    /// Rows with `i64` keys between `lo` and `hi`.
    /// Yields nothing unless the index has `Long` keys.
    fn rows_long(&self, lo: i64, hi: i64, ty: IndexType) -> RowIter<'_>;

    /// Rows with `f32` keys between `lo` and `hi`. A NaN high bound reaches
    /// past every number.
    /// Yields nothing unless the index has `Float` keys.
    fn rows_float(&self, lo: f32, hi: f32, ty: IndexType) -> RowIter<'_>;

    /// Rows with `f64` keys between `lo` and `hi`. A NaN high bound reaches
    /// past every number.
    /// Yields nothing unless the index has `Double` keys.
    fn rows_double(&self, lo: f64, hi: f64, ty: IndexType) -> RowIter<'_>;

    /// Rows with object keys between `lo` and `hi`; `None` leaves a side
    /// open.
    /// Yields nothing unless the index has object keys and every bound is a
    /// string or null.
    fn rows_object(&self, lo: Option<&Value>, hi: Option<&Value>, ty: IndexType) -> RowIter<'_>;

    /// Rows holding `value`.
    /// Yields nothing unless the index has `Bool` keys.
    fn rows_bool(&self, value: bool) -> RowIter<'_>;

    /// Rows whose key equals `value`, in ascending row order.
    ///
    /// Values that do not convert exactly to the key type match nothing.
    fn rows_eq(&self, value: &Value) -> RowIter<'_>;

    /// First row whose key equals `value`.
    fn get(&self, value: &Value) -> Option<Row>;
}
