//! Columnar tables.
//!
//! A [`Table`] owns typed columns, a [`RowManager`] for its row slots, the
//! [`TreeIndex`]es built over its columns and any registered listeners.
//! Every mutation bumps the modification counter and notifies indexes first,
//! then listeners; deletes are announced while the row is still readable.
//!
//! ```text
//! Table
//! ├── store: TableStore ── schema, columns, rows, modification counter
//! ├── indexes: Listeners<TreeIndex>  (column name -> subscription)
//! └── listeners: Listeners<Box<dyn TableListener>>
//! ```

use std::fmt;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::column::{ColumnData, Schema};
use crate::comparator::LiteralComparator;
use crate::config::{IndexConfig, TabulaConfig};
use crate::error::{Error, Result};
use crate::event::{Listeners, SubscriptionId, TableEvent, TableListener};
use crate::expression::Expression;
use crate::filter_factory::{FilterIteratorFactory, QueryPlan};
use crate::index::{Index, TreeIndex};
use crate::row_manager::{Row, RowManager};
use crate::table_iterator::TableIterator;
use crate::tuple::{RowIter, TupleSet};
use crate::value::{ColumnType, Value};

/// Schema, column data and row slots of a table.
///
/// This is the view of the table handed to indexes and listeners.
#[derive(Debug, Clone, Default)]
pub struct TableStore {
    schema: Schema,
    columns: Vec<ColumnData>,
    rows: RowManager,
    modifications: u64,
}

impl TableStore {
    /// Table schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Row slot manager.
    #[must_use]
    pub fn row_manager(&self) -> &RowManager {
        &self.rows
    }

    fn slots(&self) -> usize {
        usize::try_from(i64::from(self.rows.maximum_row()) + 1).unwrap_or(0)
    }
}

impl TupleSet for TableStore {
    fn row_count(&self) -> usize {
        self.rows.row_count()
    }

    fn is_valid_row(&self, row: Row) -> bool {
        self.rows.is_valid_row(row)
    }

    fn rows(&self) -> RowIter<'_> {
        Box::new(self.rows.rows())
    }

    fn rows_reversed(&self) -> RowIter<'_> {
        Box::new(self.rows.rows_reversed())
    }

    fn column_count(&self) -> usize {
        self.schema.len()
    }

    fn column_name(&self, col: usize) -> Option<&str> {
        self.schema.name(col)
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.index_of(name)
    }

    fn column_type(&self, col: usize) -> Option<ColumnType> {
        self.schema.column_type(col)
    }

    fn value(&self, row: Row, col: usize) -> Option<Value> {
        if !self.rows.is_valid_row(row) {
            return None;
        }
        self.columns.get(col)?.get(row)
    }

    fn column_row(&self, row: Row, col: usize) -> Option<Row> {
        self.rows.column_row(row, col)
    }

    fn table_row(&self, column_row: Row, col: usize) -> Option<Row> {
        self.rows.table_row(column_row, col)
    }

    fn modification_count(&self) -> u64 {
        self.modifications
    }
}

/// A columnar table with indexes and change listeners.
pub struct Table {
    store: TableStore,
    indexes: Listeners<TreeIndex>,
    index_ids: FxHashMap<String, SubscriptionId>,
    listeners: Listeners<Box<dyn TableListener>>,
    planner: FilterIteratorFactory,
    index_config: IndexConfig,
}

impl Default for Table {
    fn default() -> Self {
        Self::with_config(&TabulaConfig::default())
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("schema", &self.store.schema)
            .field("rows", &self.store.rows.row_count())
            .field("indexes", &self.index_ids.keys().collect::<Vec<_>>())
            .field("listeners", &self.listeners.len())
            .field("modifications", &self.store.modifications)
            .finish()
    }
}

impl Table {
    /// Creates an empty table with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table using the `[filter]` and `[index]` settings.
    #[must_use]
    pub fn with_config(config: &TabulaConfig) -> Self {
        Self {
            store: TableStore::default(),
            indexes: Listeners::new(),
            index_ids: FxHashMap::default(),
            listeners: Listeners::new(),
            planner: FilterIteratorFactory::from_config(&config.filter),
            index_config: config.index.clone(),
        }
    }

    /// Creates a table with the columns of `schema`.
    ///
    /// # Errors
    ///
    /// Returns an error if an auto-indexed column cannot be indexed.
    pub fn from_schema(schema: &Schema) -> Result<Self> {
        let mut table = Self::new();
        for (name, ty) in schema.iter() {
            table.add_column(name, ty)?;
        }
        Ok(table)
    }

    /// Overrides the planner's optimization threshold.
    pub fn set_optimize_threshold(&mut self, threshold: usize) {
        self.planner = FilterIteratorFactory::new(threshold);
    }

    /// Predicate planner used by [`select`](Self::select).
    #[must_use]
    pub fn planner(&self) -> &FilterIteratorFactory {
        &self.planner
    }

    /// Read-only storage view.
    #[must_use]
    pub fn store(&self) -> &TableStore {
        &self.store
    }

    /// Table schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.store.schema
    }

    /// Row slot manager.
    #[must_use]
    pub fn row_manager(&self) -> &RowManager {
        &self.store.rows
    }

    /// Position of a column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] for an unknown name.
    pub fn column_position(&self, name: &str) -> Result<usize> {
        self.store
            .schema
            .index_of(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Appends a column. Existing rows read the type's default value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnExists`] if the name is taken.
    pub fn add_column(&mut self, name: &str, ty: ColumnType) -> Result<usize> {
        let col = self.store.schema.add(name, ty)?;
        let mut data = ColumnData::new(ty);
        data.ensure_len(self.store.slots());
        self.store.columns.push(data);
        self.store.modifications += 1;
        debug!(column = name, column_type = %ty, "Added column");

        if self.index_config.auto_index_columns.iter().any(|c| c == name) {
            self.create_index(name)?;
        }
        Ok(col)
    }

    /// Adds a row with default values.
    pub fn add_row(&mut self) -> Row {
        let row = self.store.rows.add_row();
        let slots = self.store.slots();
        for column in &mut self.store.columns {
            column.ensure_len(slots);
            column.reset(row);
        }
        self.store.modifications += 1;
        self.fire(&TableEvent::insert(row, row));
        row
    }

    /// Adds `count` rows, returning their ids.
    pub fn add_rows(&mut self, count: usize) -> Vec<Row> {
        (0..count).map(|_| self.add_row()).collect()
    }

    /// Adds a row populated from a JSON object keyed by column name.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not an object, names an unknown
    /// column, or holds a value the column cannot store. Nothing is added
    /// on error.
    pub fn insert_json(&mut self, object: &serde_json::Value) -> Result<Row> {
        let fields = object
            .as_object()
            .ok_or_else(|| Error::InvalidRecord("expected a JSON object".to_string()))?;
        let mut cells = Vec::with_capacity(fields.len());
        for (name, json) in fields {
            let col = self.column_position(name)?;
            let ty = self.store.schema.column_type(col).unwrap_or(ColumnType::String);
            let value = Value::from_json(json).ok_or_else(|| Error::TypeMismatch {
                column: name.clone(),
                expected: ty,
                actual: "json container".to_string(),
            })?;
            check_fits(name, ty, &value)?;
            cells.push((col, value));
        }
        let row = self.add_row();
        for (col, value) in cells {
            self.set_at(row, col, value)?;
        }
        Ok(row)
    }

    /// Removes a row. Returns `false` if it was not valid.
    pub fn remove_row(&mut self, row: Row) -> bool {
        if !self.store.rows.is_valid_row(row) {
            return false;
        }
        self.fire(&TableEvent::delete(row, row));
        self.store.rows.release_row(row);
        for column in &mut self.store.columns {
            column.reset(row);
        }
        self.store.modifications += 1;
        true
    }

    /// Removes every row.
    pub fn clear(&mut self) {
        let rows: Vec<Row> = self.store.rows.rows().collect();
        for row in rows {
            self.remove_row(row);
        }
    }

    /// Value of `column` in `row`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRow`] or [`Error::ColumnNotFound`].
    pub fn get(&self, row: Row, column: &str) -> Result<Value> {
        let col = self.column_position(column)?;
        self.store.value(row, col).ok_or(Error::InvalidRow(row))
    }

    fn typed<T>(
        &self,
        row: Row,
        column: &str,
        requested: &str,
        extract: impl FnOnce(Value) -> Option<T>,
    ) -> Result<T> {
        let col = self.column_position(column)?;
        let value = self.store.value(row, col).ok_or(Error::InvalidRow(row))?;
        extract(value).ok_or_else(|| Error::TypeMismatch {
            column: column.to_string(),
            expected: self.store.schema.column_type(col).unwrap_or(ColumnType::String),
            actual: requested.to_string(),
        })
    }

    /// `Int` value of `column` in `row`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid row, unknown column or non-int column.
    pub fn get_int(&self, row: Row, column: &str) -> Result<i32> {
        self.typed(row, column, "int", |v| match v {
            Value::Int(x) => Some(x),
            _ => None,
        })
    }

    /// `Long` value of `column` in `row`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid row, unknown column or non-long column.
    pub fn get_long(&self, row: Row, column: &str) -> Result<i64> {
        self.typed(row, column, "long", |v| match v {
            Value::Long(x) => Some(x),
            _ => None,
        })
    }

    /// `Float` value of `column` in `row`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid row, unknown column or non-float column.
    pub fn get_float(&self, row: Row, column: &str) -> Result<f32> {
        self.typed(row, column, "float", |v| match v {
            Value::Float(x) => Some(x),
            _ => None,
        })
    }

    /// `Double` value of `column` in `row`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid row, unknown column or non-double column.
    pub fn get_double(&self, row: Row, column: &str) -> Result<f64> {
        self.typed(row, column, "double", |v| match v {
            Value::Double(x) => Some(x),
            _ => None,
        })
    }

    /// `Bool` value of `column` in `row`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid row, unknown column or non-bool column.
    pub fn get_bool(&self, row: Row, column: &str) -> Result<bool> {
        self.typed(row, column, "bool", |v| v.as_bool())
    }

    /// String value of `column` in `row` (`None` for null).
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid row, unknown column or non-string column.
    pub fn get_string(&self, row: Row, column: &str) -> Result<Option<String>> {
        self.typed(row, column, "string", |v| match v {
            Value::String(s) => Some(Some(s)),
            Value::Null => Some(None),
            _ => None,
        })
    }

    /// Stores a value, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRow`], [`Error::ColumnNotFound`] or
    /// [`Error::TypeMismatch`] when the value does not convert losslessly.
    pub fn set(&mut self, row: Row, column: &str, value: impl Into<Value>) -> Result<Value> {
        let col = self.column_position(column)?;
        self.set_at(row, col, value.into())
    }

    /// Stores an `Int` value.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub fn set_int(&mut self, row: Row, column: &str, value: i32) -> Result<()> {
        self.set(row, column, value).map(drop)
    }

    /// Stores a `Long` value.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub fn set_long(&mut self, row: Row, column: &str, value: i64) -> Result<()> {
        self.set(row, column, value).map(drop)
    }

    /// Stores a `Float` value.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub fn set_float(&mut self, row: Row, column: &str, value: f32) -> Result<()> {
        self.set(row, column, value).map(drop)
    }

    /// Stores a `Double` value.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub fn set_double(&mut self, row: Row, column: &str, value: f64) -> Result<()> {
        self.set(row, column, value).map(drop)
    }

    /// Stores a `Bool` value.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub fn set_bool(&mut self, row: Row, column: &str, value: bool) -> Result<()> {
        self.set(row, column, value).map(drop)
    }

    /// Stores a string value; `None` stores null.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub fn set_string(&mut self, row: Row, column: &str, value: Option<&str>) -> Result<()> {
        self.set(row, column, value.map(str::to_string)).map(drop)
    }

    /// Stores a value by column position, returning the previous one.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub fn set_at(&mut self, row: Row, col: usize, value: Value) -> Result<Value> {
        if !self.store.rows.is_valid_row(row) {
            return Err(Error::InvalidRow(row));
        }
        let name = self
            .store
            .schema
            .name(col)
            .ok_or_else(|| Error::ColumnNotFound(format!("#{col}")))?
            .to_string();
        let data = &mut self.store.columns[col];
        let previous = data.set(row, &value).map_err(|err| named(err, &name))?;
        self.store.modifications += 1;
        self.fire(&TableEvent::update(row, col, previous.clone()));
        Ok(previous)
    }

    /// Writes `value` into every row of `column` with a single event.
    ///
    /// Indexes over the column are rebuilt before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] or [`Error::TypeMismatch`].
    pub fn fill_column(&mut self, column: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let col = self.column_position(column)?;
        let ty = self.store.schema.column_type(col).unwrap_or(ColumnType::String);
        check_fits(column, ty, &value)?;

        let rows: Vec<Row> = self.store.rows.rows().collect();
        let data = &mut self.store.columns[col];
        for &row in &rows {
            data.set(row, &value).map_err(|err| named(err, column))?;
        }
        self.store.modifications += 1;
        if let (Some(&first), Some(&last)) = (rows.first(), rows.last()) {
            self.fire(&TableEvent::column_rewrite(col, first, last));
        }
        Ok(())
    }

    /// Builds an index over `column` with the configured default comparator.
    ///
    /// A case-insensitive default falls back to natural order on columns
    /// that are not strings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] for an unknown column.
    pub fn create_index(&mut self, column: &str) -> Result<()> {
        let mut comparator = self.index_config.default_comparator;
        let col = self.column_position(column)?;
        let ty = self.store.schema.column_type(col).unwrap_or(ColumnType::String);
        if !comparator.supports(ty) {
            warn!(
                column,
                comparator = %comparator,
                column_type = %ty,
                "Default comparator cannot order column, using natural order"
            );
            comparator = LiteralComparator::Natural;
        }
        self.create_index_with(column, comparator)
    }

    /// Builds an index over `column` ordered by `comparator`.
    ///
    /// An existing index with the same comparator is kept; one with a
    /// different comparator is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] or [`Error::IncompatibleComparator`].
    pub fn create_index_with(&mut self, column: &str, comparator: LiteralComparator) -> Result<()> {
        if let Some(existing) = self.index_ids.get(column).and_then(|id| self.indexes.get(*id)) {
            if existing.comparator() == comparator {
                return Ok(());
            }
            self.remove_index(column);
        }
        let index = TreeIndex::new(&self.store, column, comparator)?;
        let id = self.indexes.subscribe(index);
        self.index_ids.insert(column.to_string(), id);
        debug!(column, comparator = %comparator, "Created index");
        Ok(())
    }

    /// Unsubscribes and disposes the index over `column`.
    pub fn remove_index(&mut self, column: &str) -> bool {
        let Some(id) = self.index_ids.remove(column) else {
            return false;
        };
        match self.indexes.unsubscribe(id) {
            Some(index) => {
                index.dispose();
                true
            }
            None => false,
        }
    }

    /// Registers a listener notified after indexes on every change.
    pub fn add_listener(&mut self, listener: Box<dyn TableListener>) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    /// Unregisters a listener, returning it.
    pub fn remove_listener(&mut self, id: SubscriptionId) -> Option<Box<dyn TableListener>> {
        self.listeners.unsubscribe(id)
    }

    /// Rows satisfying `predicate`, using indexes when worthwhile.
    pub fn select<'a>(&'a self, predicate: Option<&'a Expression>) -> RowIter<'a> {
        self.planner.rows(self, predicate)
    }

    /// The plan [`select`](Self::select) would run.
    #[must_use]
    pub fn explain<'p>(&self, predicate: Option<&'p Expression>) -> QueryPlan<'p> {
        self.planner.plan(self, predicate)
    }

    /// Detached iterator over the rows, guarded against concurrent changes.
    #[must_use]
    pub fn iter_rows(&self) -> TableIterator {
        TableIterator::new(self)
    }

    fn fire(&mut self, event: &TableEvent) {
        let Self {
            store,
            indexes,
            listeners,
            ..
        } = self;
        for (_, index) in indexes.iter_mut() {
            index.table_changed(&*store, event);
        }
        for (_, listener) in listeners.iter_mut() {
            listener.table_changed(&*store, event);
        }
        for (_, index) in indexes.iter_mut() {
            if index.is_dirty() {
                index.index(&*store);
            }
        }
    }
}

fn named(err: Error, column: &str) -> Error {
    match err {
        Error::TypeMismatch {
            expected, actual, ..
        } => Error::TypeMismatch {
            column: column.to_string(),
            expected,
            actual,
        },
        other => other,
    }
}

fn check_fits(column: &str, ty: ColumnType, value: &Value) -> Result<()> {
    let fits = (ty == ColumnType::String && value.is_null()) || value.coerce(ty).is_some();
    if fits {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            column: column.to_string(),
            expected: ty,
            actual: value.type_name().to_string(),
        })
    }
}

impl TupleSet for Table {
    fn row_count(&self) -> usize {
        self.store.row_count()
    }

    fn is_valid_row(&self, row: Row) -> bool {
        self.store.is_valid_row(row)
    }

    fn rows(&self) -> RowIter<'_> {
        self.store.rows()
    }

    fn rows_reversed(&self) -> RowIter<'_> {
        self.store.rows_reversed()
    }

    fn column_count(&self) -> usize {
        self.store.column_count()
    }

    fn column_name(&self, col: usize) -> Option<&str> {
        self.store.column_name(col)
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.store.column_index(name)
    }

    fn column_type(&self, col: usize) -> Option<ColumnType> {
        self.store.column_type(col)
    }

    fn value(&self, row: Row, col: usize) -> Option<Value> {
        self.store.value(row, col)
    }

    fn column_row(&self, row: Row, col: usize) -> Option<Row> {
        self.store.column_row(row, col)
    }

    fn table_row(&self, column_row: Row, col: usize) -> Option<Row> {
        self.store.table_row(column_row, col)
    }

    fn index(&self, name: &str) -> Option<&dyn Index> {
        let id = self.index_ids.get(name)?;
        self.indexes.get(*id).map(|index| index as &dyn Index)
    }

    fn modification_count(&self) -> u64 {
        self.store.modifications
    }
}
