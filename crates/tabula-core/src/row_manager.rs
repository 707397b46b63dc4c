//! Row slot bookkeeping for columnar tables.
//!
//! A [`RowManager`] hands out integer row ids, tracks which ids are occupied
//! and recycles released ids before growing. Occupied rows are every id in
//! `[first_id, cur_id]` that is not in the ordered set of open (released)
//! ids.
//!
//! ```text
//! first_id            cur_id
//!    |                  |
//!    0  1  2  3  4  5  6
//!    #  #  .  #  .  #  #      open = {2, 4}
//! ```

use std::collections::BTreeSet;
use std::iter::FusedIterator;

/// Logical row identifier. Valid rows are non-negative.
pub type Row = i32;

/// Tracks occupied and free row slots.
#[derive(Debug, Clone)]
pub struct RowManager {
    first_id: Row,
    cur_id: Row,
    open_rows: BTreeSet<Row>,
}

impl Default for RowManager {
    fn default() -> Self {
        Self {
            first_id: 0,
            cur_id: -1,
            open_rows: BTreeSet::new(),
        }
    }
}

impl RowManager {
    /// Creates an empty row manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowest row id in use.
    ///
    /// Meaningless on an empty manager (a fresh manager reports `0` while
    /// [`maximum_row`](Self::maximum_row) reports `-1`); check
    /// [`row_count`](Self::row_count) first.
    #[must_use]
    pub fn minimum_row(&self) -> Row {
        self.first_id
    }

    /// Highest row id in use. See [`minimum_row`](Self::minimum_row) for the
    /// empty-manager precondition.
    #[must_use]
    pub fn maximum_row(&self) -> Row {
        self.cur_id
    }

    /// Number of occupied rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        let span = i64::from(self.cur_id) - i64::from(self.first_id) + 1;
        usize::try_from(span).unwrap_or(0) - self.open_rows.len()
    }

    /// Returns true if no row is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Returns true if `row` is currently occupied.
    #[must_use]
    pub fn is_valid_row(&self, row: Row) -> bool {
        row >= 0 && row >= self.first_id && row <= self.cur_id && !self.open_rows.contains(&row)
    }

    /// Releases every row.
    pub fn clear(&mut self) {
        self.first_id = 0;
        self.cur_id = -1;
        self.open_rows.clear();
    }

    /// Allocates a row, reusing the lowest released id when one exists.
    ///
    /// Without released ids the manager grows upward, except that once the
    /// lowest boundary has moved above `0` it first grows back downward.
    pub fn add_row(&mut self) -> Row {
        if let Some(row) = self.open_rows.pop_first() {
            return row;
        }
        if self.first_id == 0 {
            self.cur_id += 1;
            self.cur_id
        } else {
            self.first_id -= 1;
            self.first_id
        }
    }

    /// Releases an occupied row.
    ///
    /// Returns `false` when `row` is negative, already released or was never
    /// allocated. Releasing a boundary row shrinks the occupied span instead
    /// of growing the open set.
    pub fn release_row(&mut self, row: Row) -> bool {
        if !self.is_valid_row(row) {
            return false;
        }
        if row == self.cur_id {
            self.cur_id -= 1;
            while self.cur_id >= self.first_id && self.open_rows.remove(&self.cur_id) {
                self.cur_id -= 1;
            }
        } else if row == self.first_id {
            self.first_id += 1;
            while self.first_id <= self.cur_id && self.open_rows.remove(&self.first_id) {
                self.first_id += 1;
            }
        } else {
            self.open_rows.insert(row);
        }
        true
    }

    /// Iterates occupied rows in ascending order.
    #[must_use]
    pub fn rows(&self) -> Rows<'_> {
        Rows {
            manager: self,
            front: self.first_id.max(0),
            back: self.cur_id,
        }
    }

    /// Iterates occupied rows in descending order.
    pub fn rows_reversed(&self) -> std::iter::Rev<Rows<'_>> {
        self.rows().rev()
    }

    /// Iterates occupied rows in either direction.
    pub fn rows_in(&self, reverse: bool) -> Box<dyn Iterator<Item = Row> + '_> {
        if reverse {
            Box::new(self.rows_reversed())
        } else {
            Box::new(self.rows())
        }
    }

    /// Maps a table row to the row holding its value in column `col`.
    ///
    /// Identity for valid rows.
    #[must_use]
    pub fn column_row(&self, row: Row, _col: usize) -> Option<Row> {
        self.is_valid_row(row).then_some(row)
    }

    /// Inverse of [`column_row`](Self::column_row).
    #[must_use]
    pub fn table_row(&self, column_row: Row, _col: usize) -> Option<Row> {
        self.is_valid_row(column_row).then_some(column_row)
    }

    /// Occupied rows translated through [`column_row`](Self::column_row).
    pub fn column_rows(&self, col: usize) -> impl Iterator<Item = Row> + '_ {
        self.rows().filter_map(move |row| self.column_row(row, col))
    }

    /// Creates a cursor that walks the rows without borrowing the manager.
    #[must_use]
    pub fn cursor(&self, reverse: bool) -> RowCursor {
        RowCursor {
            position: if reverse { self.cur_id } else { self.first_id.max(0) },
            reverse,
            done: false,
        }
    }
}

/// Ascending iterator over the occupied rows of a [`RowManager`].
#[derive(Debug, Clone)]
pub struct Rows<'a> {
    manager: &'a RowManager,
    front: Row,
    back: Row,
}

impl Iterator for Rows<'_> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        while self.front <= self.back {
            let row = self.front;
            self.front += 1;
            if !self.manager.open_rows.contains(&row) {
                return Some(row);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let span = usize::try_from(i64::from(self.back) - i64::from(self.front) + 1).unwrap_or(0);
        (0, Some(span))
    }
}

impl DoubleEndedIterator for Rows<'_> {
    fn next_back(&mut self) -> Option<Row> {
        while self.front <= self.back {
            let row = self.back;
            self.back -= 1;
            if !self.manager.open_rows.contains(&row) {
                return Some(row);
            }
        }
        None
    }
}

impl FusedIterator for Rows<'_> {}

/// Detached row cursor.
///
/// Each step re-reads the manager it is given, so rows released between
/// steps are skipped and rows may be removed through the owning table while
/// the cursor is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCursor {
    position: Row,
    reverse: bool,
    done: bool,
}

impl RowCursor {
    /// Advances to the next occupied row of `manager`.
    pub fn advance(&mut self, manager: &RowManager) -> Option<Row> {
        if self.done {
            return None;
        }
        if self.reverse {
            self.position = self.position.min(manager.maximum_row());
            while self.position >= manager.minimum_row().max(0) {
                let row = self.position;
                self.position -= 1;
                if manager.is_valid_row(row) {
                    return Some(row);
                }
            }
        } else {
            self.position = self.position.max(manager.minimum_row()).max(0);
            while self.position <= manager.maximum_row() {
                let row = self.position;
                self.position += 1;
                if manager.is_valid_row(row) {
                    return Some(row);
                }
            }
        }
        self.done = true;
        None
    }
}
