//! Literal comparators shared by predicates and indexes.
//!
//! A comparison predicate can only be answered by an index whose comparator
//! is the same as the predicate's. Comparators are plain values so that
//! equality is structural.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::value::{ColumnType, Value};

/// Ordering applied to column values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralComparator {
    /// Natural value order (numeric, boolean, lexicographic).
    #[default]
    Natural,
    /// Lexicographic order after lowercasing. Strings only.
    CaseInsensitive,
}

impl LiteralComparator {
    /// Compares two values under this comparator.
    #[must_use]
    pub fn compare(self, a: &Value, b: &Value) -> Ordering {
        match (self, a, b) {
            (Self::CaseInsensitive, Value::String(x), Value::String(y)) => {
                x.to_lowercase().cmp(&y.to_lowercase())
            }
            _ => a.cmp(b),
        }
    }

    /// Returns true if this comparator can order columns of `ty`.
    #[must_use]
    pub const fn supports(self, ty: ColumnType) -> bool {
        match self {
            Self::Natural => true,
            Self::CaseInsensitive => matches!(ty, ColumnType::String),
        }
    }

    /// Maps a string to the key this comparator orders by.
    #[must_use]
    pub fn string_key(self, s: &str) -> String {
        match self {
            Self::Natural => s.to_string(),
            Self::CaseInsensitive => s.to_lowercase(),
        }
    }

    /// Snake case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Natural => "natural",
            Self::CaseInsensitive => "case_insensitive",
        }
    }
}

impl fmt::Display for LiteralComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
