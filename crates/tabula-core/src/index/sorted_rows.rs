//! Sorted key → row-set storage backing tree indexes.
//!
//! Each distinct key maps to a bitmap of the rows holding it, so duplicate
//! keys cost one bit per row. Rows sharing a key are produced in ascending
//! row order (descending for descending scans).

use roaring::RoaringBitmap;
use std::collections::BTreeMap;
use std::ops::Bound;

use crate::row_manager::Row;
use crate::tuple::RowIter;
use crate::value::OrderedFloat;

/// Ordered multimap from keys to rows.
#[derive(Debug, Clone)]
pub struct SortedRows<K> {
    map: BTreeMap<K, RoaringBitmap>,
    len: usize,
}

impl<K> Default for SortedRows<K> {
    fn default() -> Self {
        Self {
            map: BTreeMap::new(),
            len: 0,
        }
    }
}

fn slot(row: Row) -> Option<u32> {
    u32::try_from(row).ok()
}

fn to_row(slot: u32) -> Row {
    Row::try_from(slot).unwrap_or(Row::MAX)
}

impl<K: Ord> SortedRows<K> {
    /// Adds `row` under `key`. Returns false if it was already present.
    pub fn insert(&mut self, key: K, row: Row) -> bool {
        let Some(slot) = slot(row) else {
            return false;
        };
        let added = self.map.entry(key).or_default().insert(slot);
        if added {
            self.len += 1;
        }
        added
    }

    /// Removes `row` from under `key`. Returns false if it was absent.
    pub fn remove(&mut self, key: &K, row: Row) -> bool {
        let Some(slot) = slot(row) else {
            return false;
        };
        let Some(rows) = self.map.get_mut(key) else {
            return false;
        };
        let removed = rows.remove(slot);
        if removed {
            self.len -= 1;
            if rows.is_empty() {
                self.map.remove(key);
            }
        }
        removed
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.map.clear();
        self.len = 0;
    }

    /// Number of (key, row) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn unique_count(&self) -> usize {
        self.map.len()
    }

    /// First row under the smallest key.
    #[must_use]
    pub fn first_row(&self) -> Option<Row> {
        self.map.values().next().and_then(RoaringBitmap::min).map(to_row)
    }

    /// Last row under the largest key.
    #[must_use]
    pub fn last_row(&self) -> Option<Row> {
        self.map.values().next_back().and_then(RoaringBitmap::max).map(to_row)
    }

    /// Row at the middle position of the ascending order.
    #[must_use]
    pub fn median_row(&self) -> Option<Row> {
        if self.len == 0 {
            return None;
        }
        let mut remaining = u64::try_from(self.len / 2).ok()?;
        for rows in self.map.values() {
            let count = rows.len();
            if remaining < count {
                return rows.select(u32::try_from(remaining).ok()?).map(to_row);
            }
            remaining -= count;
        }
        None
    }

    /// Lowest row stored under exactly `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<Row> {
        self.map.get(key).and_then(RoaringBitmap::min).map(to_row)
    }

    /// Rows whose keys fall within the bounds.
    ///
    /// Inverted or empty bounds yield nothing.
    pub fn range<'a>(&'a self, lo: Bound<&K>, hi: Bound<&K>, descending: bool) -> RowIter<'a> {
        if is_empty_range(lo, hi) {
            return Box::new(std::iter::empty());
        }
        let buckets = self.map.range::<K, _>((lo, hi)).map(|(_, rows)| rows);
        if descending {
            Box::new(buckets.rev().flat_map(|rows| {
                let mut slots: Vec<u32> = rows.iter().collect();
                slots.reverse();
                slots.into_iter().map(to_row)
            }))
        } else {
            Box::new(buckets.flat_map(|rows| rows.iter().map(to_row)))
        }
    }

    /// Every row in key order.
    pub fn all(&self, descending: bool) -> RowIter<'_> {
        self.range(Bound::Unbounded, Bound::Unbounded, descending)
    }
}

fn is_empty_range<K: Ord>(lo: Bound<&K>, hi: Bound<&K>) -> bool {
    match (lo, hi) {
        (Bound::Included(a), Bound::Included(b)) => a > b,
        (Bound::Included(a) | Bound::Excluded(a), Bound::Excluded(b))
        | (Bound::Excluded(a), Bound::Included(b)) => a >= b,
        _ => false,
    }
}

/// Builds a key bound from a value and an inclusion flag.
pub(crate) fn bound<K>(key: &K, inclusive: bool) -> Bound<&K> {
    if inclusive {
        Bound::Included(key)
    } else {
        Bound::Excluded(key)
    }
}

/// Sorted storage in one of the six key representations.
#[derive(Debug, Clone)]
pub enum KeyedRows {
    /// `i32` keys.
    Int(SortedRows<i32>),
    /// `i64` keys.
    Long(SortedRows<i64>),
    /// `f32` keys, NaN last.
    Float(SortedRows<OrderedFloat<f32>>),
    /// `f64` keys, NaN last.
    Double(SortedRows<OrderedFloat<f64>>),
    /// Boolean keys.
    Bool(SortedRows<bool>),
    /// Nullable string keys, null first.
    Object(SortedRows<Option<String>>),
}

macro_rules! dispatch {
    ($self:expr, $rows:ident => $body:expr) => {
        match $self {
            KeyedRows::Int($rows) => $body,
            KeyedRows::Long($rows) => $body,
            KeyedRows::Float($rows) => $body,
            KeyedRows::Double($rows) => $body,
            KeyedRows::Bool($rows) => $body,
            KeyedRows::Object($rows) => $body,
        }
    };
}

impl KeyedRows {
    /// Variant name.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Bool(_) => "bool",
            Self::Object(_) => "object",
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        dispatch!(self, rows => rows.len())
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn unique_count(&self) -> usize {
        dispatch!(self, rows => rows.unique_count())
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        dispatch!(self, rows => rows.clear());
    }

    /// Row with the smallest key.
    #[must_use]
    pub fn first_row(&self) -> Option<Row> {
        dispatch!(self, rows => rows.first_row())
    }

    /// Row with the largest key.
    #[must_use]
    pub fn last_row(&self) -> Option<Row> {
        dispatch!(self, rows => rows.last_row())
    }

    /// Row at the middle of the key order.
    #[must_use]
    pub fn median_row(&self) -> Option<Row> {
        dispatch!(self, rows => rows.median_row())
    }

    /// Every row in key order.
    pub fn all(&self, descending: bool) -> RowIter<'_> {
        dispatch!(self, rows => rows.all(descending))
    }
}
