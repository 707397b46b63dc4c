//! Table change events and handle-based listener registries.
//!
//! A table owns its listeners. Registering one returns a
//! [`SubscriptionId`]; handing the id back unsubscribes and returns the
//! listener to the caller.

use crate::row_manager::Row;
use crate::tuple::TupleSet;
use crate::value::Value;

/// Kind of change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Rows were added.
    Insert,
    /// Rows are about to be removed. Their values are still readable.
    Delete,
    /// Values changed.
    Update,
}

/// Columns affected by a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnScope {
    /// Every column (whole-row insert or delete).
    All,
    /// A single column.
    Column(usize),
}

/// A change to a contiguous range of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TableEvent {
    /// Kind of change.
    pub kind: EventKind,
    /// First affected row.
    pub start: Row,
    /// Last affected row (inclusive).
    pub end: Row,
    /// Affected columns.
    pub column: ColumnScope,
    /// Value before a single-cell update. `None` for bulk rewrites.
    pub previous: Option<Value>,
}

impl TableEvent {
    /// Rows `start..=end` were inserted.
    #[must_use]
    pub fn insert(start: Row, end: Row) -> Self {
        Self {
            kind: EventKind::Insert,
            start,
            end,
            column: ColumnScope::All,
            previous: None,
        }
    }

    /// Rows `start..=end` are being deleted.
    #[must_use]
    pub fn delete(start: Row, end: Row) -> Self {
        Self {
            kind: EventKind::Delete,
            start,
            end,
            column: ColumnScope::All,
            previous: None,
        }
    }

    /// One cell changed from `previous`.
    #[must_use]
    pub fn update(row: Row, col: usize, previous: Value) -> Self {
        Self {
            kind: EventKind::Update,
            start: row,
            end: row,
            column: ColumnScope::Column(col),
            previous: Some(previous),
        }
    }

    /// Every value of a column may have changed.
    #[must_use]
    pub fn column_rewrite(col: usize, start: Row, end: Row) -> Self {
        Self {
            kind: EventKind::Update,
            start,
            end,
            column: ColumnScope::Column(col),
            previous: None,
        }
    }

    /// Returns true if the event touches column `col`.
    #[must_use]
    pub fn affects_column(&self, col: usize) -> bool {
        match self.column {
            ColumnScope::All => true,
            ColumnScope::Column(c) => c == col,
        }
    }

    /// Affected rows.
    pub fn rows(&self) -> std::ops::RangeInclusive<Row> {
        self.start..=self.end
    }
}

/// Receives change notifications from a table.
pub trait TableListener {
    /// Called after inserts and updates, and before deletes.
    fn table_changed(&mut self, table: &dyn TupleSet, event: &TableEvent);
}

impl<F> TableListener for F
where
    F: FnMut(&dyn TupleSet, &TableEvent),
{
    fn table_changed(&mut self, table: &dyn TupleSet, event: &TableEvent) {
        self(table, event);
    }
}

/// Token returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Ordered registry of subscribers.
#[derive(Debug)]
pub struct Listeners<L> {
    next_id: u64,
    entries: Vec<(SubscriptionId, L)>,
}

impl<L> Default for Listeners<L> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<L> Listeners<L> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber.
    pub fn subscribe(&mut self, listener: L) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    /// Removes a subscriber, returning it.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> Option<L> {
        let pos = self.entries.iter().position(|(sid, _)| *sid == id)?;
        Some(self.entries.remove(pos).1)
    }

    /// Subscriber registered under `id`.
    #[must_use]
    pub fn get(&self, id: SubscriptionId) -> Option<&L> {
        self.entries.iter().find(|(sid, _)| *sid == id).map(|(_, l)| l)
    }

    /// Mutable subscriber registered under `id`.
    pub fn get_mut(&mut self, id: SubscriptionId) -> Option<&mut L> {
        self.entries
            .iter_mut()
            .find(|(sid, _)| *sid == id)
            .map(|(_, l)| l)
    }

    /// Subscribers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (SubscriptionId, &L)> {
        self.entries.iter().map(|(id, l)| (*id, l))
    }

    /// Mutable subscribers in registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SubscriptionId, &mut L)> {
        self.entries.iter_mut().map(|(id, l)| (*id, l))
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
