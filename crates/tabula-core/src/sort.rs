//! Multi-column sort specifications.
//!
//! A [`Sort`] lists column names with a direction and can be parsed from
//! text such as `"name DESC, [zip code] ASC"`. Names containing spaces
//! must be bracketed; the direction defaults to ascending.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::comparator::LiteralComparator;
use crate::error::{Error, Result};
use crate::row_manager::Row;
use crate::tuple::TupleSet;

/// One column of a sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    /// Column name.
    pub column: String,
    /// Ascending when true.
    pub ascending: bool,
}

/// Ordered list of sort keys, most significant first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    keys: Vec<SortKey>,
}

impl Sort {
    /// Creates an empty sort; every row compares equal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ascending sort over `columns`.
    #[must_use]
    pub fn ascending<S: AsRef<str>>(columns: &[S]) -> Self {
        let mut sort = Self::new();
        for column in columns {
            sort.add(column.as_ref(), true);
        }
        sort
    }

    /// Appends a key.
    pub fn add(&mut self, column: &str, ascending: bool) {
        self.keys.push(SortKey {
            column: column.to_string(),
            ascending,
        });
    }

    /// Builder form of [`add`](Self::add).
    #[must_use]
    pub fn then(mut self, column: &str, ascending: bool) -> Self {
        self.add(column, ascending);
        self
    }

    /// Sort keys.
    #[must_use]
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Parses a comma-separated specification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSort`] for an empty term, an unbalanced
    /// bracket, or an unbracketed name containing whitespace.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut sort = Self::new();
        if spec.trim().is_empty() {
            return Ok(sort);
        }
        for term in split_terms(spec)? {
            let (column, ascending) = parse_term(term)?;
            sort.add(column, ascending);
        }
        Ok(sort)
    }

    /// Resolves the column names against `source`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] for an unknown column.
    pub fn comparator(&self, source: &dyn TupleSet) -> Result<SortComparator> {
        let keys = self
            .keys
            .iter()
            .map(|key| {
                let col = source
                    .column_index(&key.column)
                    .ok_or_else(|| Error::ColumnNotFound(key.column.clone()))?;
                Ok(TupleComparator::new(col, key.ascending))
            })
            .collect::<Result<_>>()?;
        Ok(SortComparator { keys })
    }
}

fn split_terms(spec: &str) -> Result<Vec<&str>> {
    let mut terms = Vec::new();
    let mut start = 0;
    let mut in_brackets = false;
    for (i, c) in spec.char_indices() {
        match c {
            '[' if in_brackets => {
                return Err(Error::InvalidSort(format!("nested '[' in '{spec}'")));
            }
            '[' => in_brackets = true,
            ']' if !in_brackets => {
                return Err(Error::InvalidSort(format!("unmatched ']' in '{spec}'")));
            }
            ']' => in_brackets = false,
            ',' if !in_brackets => {
                terms.push(&spec[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if in_brackets {
        return Err(Error::InvalidSort(format!("unclosed '[' in '{spec}'")));
    }
    terms.push(&spec[start..]);
    Ok(terms)
}

fn strip_direction(term: &str) -> (&str, bool) {
    if let Some((head, last)) = term.rsplit_once(char::is_whitespace) {
        if last.eq_ignore_ascii_case("desc") {
            return (head.trim_end(), false);
        }
        if last.eq_ignore_ascii_case("asc") {
            return (head.trim_end(), true);
        }
    }
    (term, true)
}

fn parse_term(term: &str) -> Result<(&str, bool)> {
    let (name, ascending) = strip_direction(term.trim());
    let column = if let Some(inner) = name.strip_prefix('[') {
        inner
            .strip_suffix(']')
            .filter(|inner| !inner.contains(['[', ']']))
            .ok_or_else(|| Error::InvalidSort(format!("malformed column '{name}'")))?
    } else if name.contains(char::is_whitespace) || name.contains([']', '[']) {
        return Err(Error::InvalidSort(format!(
            "column '{name}' must be bracketed"
        )));
    } else {
        name
    };
    if column.is_empty() {
        return Err(Error::InvalidSort(format!("empty column in '{term}'")));
    }
    Ok((column, ascending))
}

impl FromStr for Sort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let direction = if key.ascending { "ASC" } else { "DESC" };
            write!(f, "[{}] {direction}", key.column)?;
        }
        Ok(())
    }
}

/// Orders two rows by one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TupleComparator {
    col: usize,
    ascending: bool,
    comparator: LiteralComparator,
}

impl TupleComparator {
    /// Natural-order comparator over column `col`.
    #[must_use]
    pub fn new(col: usize, ascending: bool) -> Self {
        Self::with_comparator(col, ascending, LiteralComparator::Natural)
    }

    /// Comparator over column `col` using `comparator`.
    #[must_use]
    pub fn with_comparator(col: usize, ascending: bool, comparator: LiteralComparator) -> Self {
        Self {
            col,
            ascending,
            comparator,
        }
    }

    /// Compares column values of rows `a` and `b`.
    ///
    /// Missing values compare as null.
    #[must_use]
    pub fn compare(&self, source: &dyn TupleSet, a: Row, b: Row) -> Ordering {
        let left = source.value(a, self.col).unwrap_or_default();
        let right = source.value(b, self.col).unwrap_or_default();
        let ordering = self.comparator.compare(&left, &right);
        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

/// Lexicographic combination of [`TupleComparator`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortComparator {
    keys: Vec<TupleComparator>,
}

impl SortComparator {
    /// Compares two rows key by key.
    #[must_use]
    pub fn compare(&self, source: &dyn TupleSet, a: Row, b: Row) -> Ordering {
        self.keys
            .iter()
            .map(|key| key.compare(source, a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// Buffers `rows` and returns them ordered by `sort`.
///
/// The sort is stable: rows comparing equal keep their input order.
///
/// # Errors
///
/// Returns [`Error::ColumnNotFound`] for an unknown sort column.
pub fn sorted_rows(
    source: &dyn TupleSet,
    rows: impl IntoIterator<Item = Row>,
    sort: &Sort,
) -> Result<std::vec::IntoIter<Row>> {
    let comparator = sort.comparator(source)?;
    let mut buffer: Vec<Row> = rows.into_iter().collect();
    buffer.sort_by(|&a, &b| comparator.compare(source, a, b));
    Ok(buffer.into_iter())
}
