//! Column types and cell values.
//!
//! Values of different numeric kinds compare numerically and exactly: an
//! `Int` and a `Double` are equal only when the double holds exactly that
//! integer. Across families the order is `Null < Bool < numbers < String`.
//! Floating point values use a total order in which NaN sorts after every
//! other number.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Declared type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// Boolean.
    Bool,
    /// Nullable string, ordered by a comparator.
    String,
}

impl ColumnType {
    /// Returns true for the four numeric types.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Long | Self::Float | Self::Double)
    }

    /// Value stored in a freshly added row.
    #[must_use]
    pub fn default_value(self) -> Value {
        match self {
            Self::Int => Value::Int(0),
            Self::Long => Value::Long(0),
            Self::Float => Value::Float(0.0),
            Self::Double => Value::Double(0.0),
            Self::Bool => Value::Bool(false),
            Self::String => Value::Null,
        }
    }

    /// Lowercase type name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::String => "string",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single cell value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Missing value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// String.
    String(String),
}

impl Value {
    /// Column type this value naturally belongs to (`None` for null).
    #[must_use]
    pub const fn column_type(&self) -> Option<ColumnType> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(ColumnType::Bool),
            Self::Int(_) => Some(ColumnType::Int),
            Self::Long(_) => Some(ColumnType::Long),
            Self::Float(_) => Some(ColumnType::Float),
            Self::Double(_) => Some(ColumnType::Double),
            Self::String(_) => Some(ColumnType::String),
        }
    }

    /// Type name used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self.column_type() {
            Some(ty) => ty.name(),
            None => "null",
        }
    }

    /// Returns true for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Boolean content, if this is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral content widened to `i64`.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v as i64),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric content as `f64` (lossy for large longs).
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(f64::from(*v)),
            Self::Long(v) => Some(*v as f64),
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// String content, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts this value to `ty` only when the conversion is lossless.
    ///
    /// Null never coerces. Integral values coerce to floats when the float
    /// represents them exactly; floats coerce to integers when they hold an
    /// integral value in range.
    #[must_use]
    pub fn coerce(&self, ty: ColumnType) -> Option<Value> {
        match (ty, self) {
            (ColumnType::Bool, Self::Bool(b)) => Some(Self::Bool(*b)),
            (ColumnType::String, Self::String(s)) => Some(Self::String(s.clone())),
            (ColumnType::Int, _) => self
                .exact_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(Self::Int),
            (ColumnType::Long, _) => self.exact_i64().map(Self::Long),
            (ColumnType::Float, Self::Float(v)) => Some(Self::Float(*v)),
            (ColumnType::Float, Self::Double(v)) => {
                let narrowed = *v as f32;
                (f64::from(narrowed) == *v || v.is_nan()).then_some(Self::Float(narrowed))
            }
            (ColumnType::Float, _) => self.as_i64().and_then(|i| {
                let narrowed = i as f32;
                (f64::from(narrowed) as i128 == i128::from(i)).then_some(Self::Float(narrowed))
            }),
            (ColumnType::Double, Self::Float(v)) => Some(Self::Double(f64::from(*v))),
            (ColumnType::Double, Self::Double(v)) => Some(Self::Double(*v)),
            (ColumnType::Double, _) => self.as_i64().and_then(|i| {
                let widened = i as f64;
                (widened as i128 == i128::from(i)).then_some(Self::Double(widened))
            }),
            _ => None,
        }
    }

    fn exact_i64(&self) -> Option<i64> {
        match self {
            Self::Int(_) | Self::Long(_) => self.as_i64(),
            Self::Float(_) | Self::Double(_) => {
                let f = self.as_f64()?;
                (f.is_finite() && f.fract() == 0.0 && (I64_LOWER..I64_UPPER).contains(&f))
                    .then_some(f as i64)
            }
            _ => None,
        }
    }

    /// Converts a JSON scalar into a value.
    ///
    /// Integers that fit in 32 bits become [`Value::Int`], other integers
    /// [`Value::Long`]. Arrays and objects have no value representation.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(Self::Null),
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(i32::try_from(i).map_or(Self::Long(i), Self::Int))
                } else {
                    n.as_f64().map(Self::Double)
                }
            }
            serde_json::Value::String(s) => Some(Self::String(s.clone())),
            _ => None,
        }
    }

    const fn family(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Long(_) | Self::Float(_) | Self::Double(_) => 2,
            Self::String(_) => 3,
        }
    }
}

const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// Exact comparison of an integer with a float (NaN sorts last).
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() || f >= I64_UPPER {
        return Ordering::Less;
    }
    if f < I64_LOWER {
        return Ordering::Greater;
    }
    let truncated = f.trunc();
    match i.cmp(&(truncated as i64)) {
        Ordering::Equal => OrderedFloat(truncated).cmp(&OrderedFloat(f)),
        other => other,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            _ if self.family() != other.family() => self.family().cmp(&other.family()),
            _ => match (self.as_i64(), other.as_i64()) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(a), None) => cmp_int_float(a, other.as_f64().unwrap_or(f64::NAN)),
                (None, Some(b)) => cmp_int_float(b, self.as_f64().unwrap_or(f64::NAN)).reverse(),
                (None, None) => OrderedFloat(self.as_f64().unwrap_or(f64::NAN))
                    .cmp(&OrderedFloat(other.as_f64().unwrap_or(f64::NAN))),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}L"),
            Self::Float(v) => write!(f, "{v}f"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "'{s}'"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Floating point types usable as ordered index keys.
pub trait FloatKey: Copy + PartialOrd + fmt::Debug {
    /// Returns true if the value is NaN.
    fn is_nan_key(self) -> bool;
}

impl FloatKey for f32 {
    fn is_nan_key(self) -> bool {
        self.is_nan()
    }
}

impl FloatKey for f64 {
    fn is_nan_key(self) -> bool {
        self.is_nan()
    }
}

/// Wrapper for floats that implements `Ord` (NaN sorts last).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat<F>(pub F);

impl<F: FloatKey> PartialEq for OrderedFloat<F> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<F: FloatKey> Eq for OrderedFloat<F> {}

impl<F: FloatKey> PartialOrd for OrderedFloat<F> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<F: FloatKey> Ord for OrderedFloat<F> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or_else(|| {
            match (self.0.is_nan_key(), other.0.is_nan_key()) {
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                _ => Ordering::Equal,
            }
        })
    }
}
