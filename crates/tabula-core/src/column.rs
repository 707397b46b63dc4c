//! Dense typed column storage and table schemas.
//!
//! ```text
//! Schema (IndexMap, insertion ordered)
//! ├── "name"  -> String -> ColumnData::String(Vec<Option<String>>)
//! ├── "age"   -> Int    -> ColumnData::Int(Vec<i32>)
//! └── "score" -> Double -> ColumnData::Double(Vec<f64>)
//! ```
//!
//! Columns are indexed by storage row. Primitive columns are never null and
//! read as their type's default until written; string columns are nullable.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::row_manager::Row;
use crate::value::{ColumnType, Value};

/// A typed column storing values of a specific type.
#[derive(Debug, Clone)]
pub enum ColumnData {
    /// 32-bit integers.
    Int(Vec<i32>),
    /// 64-bit integers.
    Long(Vec<i64>),
    /// 32-bit floats.
    Float(Vec<f32>),
    /// 64-bit floats.
    Double(Vec<f64>),
    /// Booleans.
    Bool(Vec<bool>),
    /// Nullable strings.
    String(Vec<Option<String>>),
}

impl ColumnData {
    /// Creates an empty column of the given type.
    #[must_use]
    pub fn new(ty: ColumnType) -> Self {
        match ty {
            ColumnType::Int => Self::Int(Vec::new()),
            ColumnType::Long => Self::Long(Vec::new()),
            ColumnType::Float => Self::Float(Vec::new()),
            ColumnType::Double => Self::Double(Vec::new()),
            ColumnType::Bool => Self::Bool(Vec::new()),
            ColumnType::String => Self::String(Vec::new()),
        }
    }

    /// Declared type.
    #[must_use]
    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::Int(_) => ColumnType::Int,
            Self::Long(_) => ColumnType::Long,
            Self::Float(_) => ColumnType::Float,
            Self::Double(_) => ColumnType::Double,
            Self::Bool(_) => ColumnType::Bool,
            Self::String(_) => ColumnType::String,
        }
    }

    /// Number of allocated slots.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Long(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::String(v) => v.len(),
        }
    }

    /// Returns true if no slot is allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grows the column to at least `len` slots, filling with defaults.
    pub fn ensure_len(&mut self, len: usize) {
        match self {
            Self::Int(v) => grow(v, len),
            Self::Long(v) => grow(v, len),
            Self::Float(v) => grow(v, len),
            Self::Double(v) => grow(v, len),
            Self::Bool(v) => grow(v, len),
            Self::String(v) => grow(v, len),
        }
    }

    /// Value stored in `row`.
    #[must_use]
    pub fn get(&self, row: Row) -> Option<Value> {
        let slot = usize::try_from(row).ok()?;
        match self {
            Self::Int(v) => v.get(slot).map(|x| Value::Int(*x)),
            Self::Long(v) => v.get(slot).map(|x| Value::Long(*x)),
            Self::Float(v) => v.get(slot).map(|x| Value::Float(*x)),
            Self::Double(v) => v.get(slot).map(|x| Value::Double(*x)),
            Self::Bool(v) => v.get(slot).map(|x| Value::Bool(*x)),
            Self::String(v) => v.get(slot).map(|x| Value::from(x.clone())),
        }
    }

    /// Stores `value` in `row`, returning the previous value.
    ///
    /// The value must convert losslessly to the column type; `Null` is only
    /// accepted by string columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] (with an empty column name, filled in
    /// by the caller) when the value does not fit, or [`Error::InvalidRow`]
    /// for a negative row.
    pub fn set(&mut self, row: Row, value: &Value) -> Result<Value> {
        let slot = usize::try_from(row).map_err(|_| Error::InvalidRow(row))?;
        let ty = self.column_type();
        let coerced = match (ty, value) {
            (ColumnType::String, Value::Null) => Value::Null,
            _ => value.coerce(ty).ok_or_else(|| Error::TypeMismatch {
                column: String::new(),
                expected: ty,
                actual: value.type_name().to_string(),
            })?,
        };
        self.ensure_len(slot + 1);
        let previous = self.get(row).unwrap_or_default();
        match (self, coerced) {
            (Self::Int(v), Value::Int(x)) => v[slot] = x,
            (Self::Long(v), Value::Long(x)) => v[slot] = x,
            (Self::Float(v), Value::Float(x)) => v[slot] = x,
            (Self::Double(v), Value::Double(x)) => v[slot] = x,
            (Self::Bool(v), Value::Bool(x)) => v[slot] = x,
            (Self::String(v), Value::String(x)) => v[slot] = Some(x),
            (Self::String(v), Value::Null) => v[slot] = None,
            _ => return Err(Error::Internal(format!("coercion to {ty} produced another type"))),
        }
        Ok(previous)
    }

    /// Resets `row` to the column default.
    pub fn reset(&mut self, row: Row) {
        let Ok(slot) = usize::try_from(row) else {
            return;
        };
        match self {
            Self::Int(v) => reset_slot(v, slot),
            Self::Long(v) => reset_slot(v, slot),
            Self::Float(v) => reset_slot(v, slot),
            Self::Double(v) => reset_slot(v, slot),
            Self::Bool(v) => reset_slot(v, slot),
            Self::String(v) => reset_slot(v, slot),
        }
    }
}

fn grow<T: Default + Clone>(values: &mut Vec<T>, len: usize) {
    if values.len() < len {
        values.resize(len, T::default());
    }
}

fn reset_slot<T: Default>(values: &mut [T], slot: usize) {
    if let Some(v) = values.get_mut(slot) {
        *v = T::default();
    }
}

/// Ordered mapping of column names to types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: IndexMap<String, ColumnType>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column, returning its position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnExists`] if the name is taken.
    pub fn add(&mut self, name: &str, ty: ColumnType) -> Result<usize> {
        if self.columns.contains_key(name) {
            return Err(Error::ColumnExists(name.to_string()));
        }
        self.columns.insert(name.to_string(), ty);
        Ok(self.columns.len() - 1)
    }

    /// Builder form of [`add`](Self::add) for fixed schemas.
    ///
    /// # Panics
    ///
    /// Panics if the column name is already present.
    #[must_use]
    pub fn with(mut self, name: &str, ty: ColumnType) -> Self {
        if let Err(err) = self.add(name, ty) {
            panic!("{err}");
        }
        self
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.get_index_of(name)
    }

    /// Name of the column at `col`.
    #[must_use]
    pub fn name(&self, col: usize) -> Option<&str> {
        self.columns.get_index(col).map(|(name, _)| name.as_str())
    }

    /// Type of the column at `col`.
    #[must_use]
    pub fn column_type(&self, col: usize) -> Option<ColumnType> {
        self.columns.get_index(col).map(|(_, ty)| *ty)
    }

    /// Columns in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnType)> {
        self.columns.iter().map(|(name, ty)| (name.as_str(), *ty))
    }
}
