//! Tree-backed column index with incremental maintenance.

use std::ops::Bound;

use tracing::{debug, warn};

use super::sorted_rows::{bound, KeyedRows, SortedRows};
use super::{Index, IndexType};
use crate::comparator::LiteralComparator;
use crate::error::{Error, Result};
use crate::event::{ColumnScope, EventKind, TableEvent, TableListener};
use crate::row_manager::Row;
use crate::tuple::{RowIter, TupleSet};
use crate::value::{ColumnType, OrderedFloat, Value};

/// Sorted index over one column, stored as a BTreeMap of row bitmaps.
///
/// The key representation is fixed at construction from the column type.
/// A table keeps its indexes current by forwarding its change events; an
/// update that does not carry the previous value marks the index dirty and
/// the owner calls [`TreeIndex::index`] to rebuild it.
#[derive(Debug, Clone)]
pub struct TreeIndex {
    column: String,
    col: usize,
    column_type: ColumnType,
    comparator: LiteralComparator,
    keys: KeyedRows,
    dirty: bool,
}

impl TreeIndex {
    /// Builds an index over `column` of `source`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] for an unknown column and
    /// [`Error::IncompatibleComparator`] when the comparator cannot order
    /// the column type.
    pub fn new(source: &dyn TupleSet, column: &str, comparator: LiteralComparator) -> Result<Self> {
        let col = source
            .column_index(column)
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))?;
        let column_type = source
            .column_type(col)
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))?;
        if !comparator.supports(column_type) {
            return Err(Error::IncompatibleComparator {
                column: column.to_string(),
                column_type,
                comparator: comparator.name().to_string(),
            });
        }

        let keys = match column_type {
            ColumnType::Int => KeyedRows::Int(SortedRows::default()),
            ColumnType::Long => KeyedRows::Long(SortedRows::default()),
            ColumnType::Float => KeyedRows::Float(SortedRows::default()),
            ColumnType::Double => KeyedRows::Double(SortedRows::default()),
            ColumnType::Bool => KeyedRows::Bool(SortedRows::default()),
            ColumnType::String => KeyedRows::Object(SortedRows::default()),
        };
        let mut index = Self {
            column: column.to_string(),
            col,
            column_type,
            comparator,
            keys,
            dirty: false,
        };
        index.index(source);
        Ok(index)
    }

    /// Rebuilds the index from every valid row of `source`.
    pub fn index(&mut self, source: &dyn TupleSet) {
        self.keys.clear();
        for row in source.rows() {
            if let Some(value) = source.value(row, self.col) {
                self.apply(&value, row, true);
            }
        }
        self.dirty = false;
        debug!(
            column = %self.column,
            rows = self.keys.len(),
            keys = self.keys.unique_count(),
            "Rebuilt tree index"
        );
    }

    /// Position of the indexed column in its table.
    #[must_use]
    pub fn column_position(&self) -> usize {
        self.col
    }

    /// Returns true if the index must be rebuilt before use.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Key storage.
    #[must_use]
    pub fn keys(&self) -> &KeyedRows {
        &self.keys
    }

    /// Releases the index. The owning table drops its subscription first.
    pub fn dispose(self) {
        debug!(column = %self.column, "Disposed tree index");
    }

    fn apply(&mut self, value: &Value, row: Row, add: bool) {
        let comparator = self.comparator;
        let applied = match (&mut self.keys, value) {
            (KeyedRows::Int(rows), Value::Int(k)) => toggle(rows, *k, row, add),
            (KeyedRows::Long(rows), Value::Long(k)) => toggle(rows, *k, row, add),
            (KeyedRows::Float(rows), Value::Float(k)) => toggle(rows, OrderedFloat(*k), row, add),
            (KeyedRows::Double(rows), Value::Double(k)) => toggle(rows, OrderedFloat(*k), row, add),
            (KeyedRows::Bool(rows), Value::Bool(k)) => toggle(rows, *k, row, add),
            (KeyedRows::Object(rows), Value::String(s)) => {
                toggle(rows, Some(comparator.string_key(s)), row, add)
            }
            (KeyedRows::Object(rows), Value::Null) => toggle(rows, None, row, add),
            (keys, other) => {
                warn!(
                    column = %self.column,
                    index_kind = keys.kind(),
                    value_type = other.type_name(),
                    "Ignoring value of the wrong type"
                );
                true
            }
        };
        if !applied && !add {
            debug!(column = %self.column, row, "Row was not present in index");
        }
    }

    /// Key for an object bound; the outer `None` rejects a non-string bound.
    fn object_key(&self, value: &Value) -> Option<Option<String>> {
        match value {
            Value::String(s) => Some(Some(self.comparator.string_key(s))),
            Value::Null => Some(None),
            other => {
                warn!(
                    column = %self.column,
                    value_type = other.type_name(),
                    "Object index bounded by a non-string value"
                );
                None
            }
        }
    }

    fn mismatch(&self, requested: &str) -> RowIter<'_> {
        warn!(
            column = %self.column,
            requested,
            index_kind = self.keys.kind(),
            "Scan does not match the index key type"
        );
        Box::new(std::iter::empty())
    }
}

fn toggle<K: Ord>(rows: &mut SortedRows<K>, key: K, row: Row, add: bool) -> bool {
    if add {
        rows.insert(key, row)
    } else {
        rows.remove(&key, row)
    }
}

fn scan<'a, K: Ord>(rows: &'a SortedRows<K>, lo: &K, hi: &K, ty: IndexType) -> RowIter<'a> {
    rows.range(
        bound(lo, ty.left_inclusive()),
        bound(hi, ty.right_inclusive()),
        ty.is_descending(),
    )
}

impl Index for TreeIndex {
    fn column(&self) -> &str {
        &self.column
    }

    fn column_type(&self) -> ColumnType {
        self.column_type
    }

    fn comparator(&self) -> LiteralComparator {
        self.comparator
    }

    fn size(&self) -> usize {
        self.keys.len()
    }

    fn unique_count(&self) -> usize {
        self.keys.unique_count()
    }

    fn minimum(&self) -> Option<Row> {
        self.keys.first_row()
    }

    fn maximum(&self) -> Option<Row> {
        self.keys.last_row()
    }

    fn median(&self) -> Option<Row> {
        self.keys.median_row()
    }

    fn all_rows(&self, ty: IndexType) -> RowIter<'_> {
        self.keys.all(ty.is_descending())
    }

    fn rows_int(&self, lo: i32, hi: i32, ty: IndexType) -> RowIter<'_> {
        match &self.keys {
            KeyedRows::Int(rows) => scan(rows, &lo, &hi, ty),
            _ => self.mismatch("int"),
        }
    }

    fn rows_long(&self, lo: i64, hi: i64, ty: IndexType) -> RowIter<'_> {
        match &self.keys {
            KeyedRows::Long(rows) => scan(rows, &lo, &hi, ty),
            _ => self.mismatch("long"),
        }
    }

    fn rows_float(&self, lo: f32, hi: f32, ty: IndexType) -> RowIter<'_> {
        match &self.keys {
            KeyedRows::Float(rows) => scan(rows, &OrderedFloat(lo), &OrderedFloat(hi), ty),
            _ => self.mismatch("float"),
        }
    }

    fn rows_double(&self, lo: f64, hi: f64, ty: IndexType) -> RowIter<'_> {
        match &self.keys {
            KeyedRows::Double(rows) => scan(rows, &OrderedFloat(lo), &OrderedFloat(hi), ty),
            _ => self.mismatch("double"),
        }
    }

    fn rows_object(&self, lo: Option<&Value>, hi: Option<&Value>, ty: IndexType) -> RowIter<'_> {
        let KeyedRows::Object(rows) = &self.keys else {
            return self.mismatch("object");
        };
        let (Ok(lo_key), Ok(hi_key)) = (
            lo.map(|v| self.object_key(v).ok_or(())).transpose(),
            hi.map(|v| self.object_key(v).ok_or(())).transpose(),
        ) else {
            return Box::new(std::iter::empty());
        };
        let lo_bound = lo_key
            .as_ref()
            .map_or(Bound::Unbounded, |k| bound(k, ty.left_inclusive()));
        let hi_bound = hi_key
            .as_ref()
            .map_or(Bound::Unbounded, |k| bound(k, ty.right_inclusive()));
        rows.range(lo_bound, hi_bound, ty.is_descending())
    }

    fn rows_bool(&self, value: bool) -> RowIter<'_> {
        match &self.keys {
            KeyedRows::Bool(rows) => scan(rows, &value, &value, IndexType::AII),
            _ => self.mismatch("bool"),
        }
    }

    fn rows_eq(&self, value: &Value) -> RowIter<'_> {
        let key = if value.is_null() && self.column_type == ColumnType::String {
            Some(Value::Null)
        } else {
            value.coerce(self.column_type)
        };
        match (&self.keys, key) {
            (KeyedRows::Int(rows), Some(Value::Int(k))) => scan(rows, &k, &k, IndexType::AII),
            (KeyedRows::Long(rows), Some(Value::Long(k))) => scan(rows, &k, &k, IndexType::AII),
            (KeyedRows::Float(rows), Some(Value::Float(k))) => {
                scan(rows, &OrderedFloat(k), &OrderedFloat(k), IndexType::AII)
            }
            (KeyedRows::Double(rows), Some(Value::Double(k))) => {
                scan(rows, &OrderedFloat(k), &OrderedFloat(k), IndexType::AII)
            }
            (KeyedRows::Bool(rows), Some(Value::Bool(k))) => scan(rows, &k, &k, IndexType::AII),
            (KeyedRows::Object(_), Some(v)) => self.rows_object(Some(&v), Some(&v), IndexType::AII),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn get(&self, value: &Value) -> Option<Row> {
        self.rows_eq(value).next()
    }
}

impl TableListener for TreeIndex {
    fn table_changed(&mut self, table: &dyn TupleSet, event: &TableEvent) {
        match (event.kind, event.column) {
            (EventKind::Insert, ColumnScope::All) => {
                for row in event.rows() {
                    if let Some(value) = table.value(row, self.col) {
                        self.apply(&value, row, true);
                    }
                }
            }
            (EventKind::Delete, ColumnScope::All) => {
                for row in event.rows() {
                    if let Some(value) = table.value(row, self.col) {
                        self.apply(&value, row, false);
                    }
                }
            }
            (EventKind::Update, ColumnScope::Column(col)) if col == self.col => {
                match &event.previous {
                    Some(previous) => {
                        for row in event.rows() {
                            self.apply(previous, row, false);
                            if let Some(value) = table.value(row, self.col) {
                                self.apply(&value, row, true);
                            }
                        }
                    }
                    None => self.dirty = true,
                }
            }
            _ => {}
        }
    }
}
