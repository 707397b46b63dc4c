//! Row iterator adapters.

use roaring::RoaringBitmap;
use std::borrow::Cow;
use std::iter::{Fuse, FusedIterator};

use crate::expression::Expression;
use crate::row_manager::Row;
use crate::tuple::{Tuple, TupleSet};

/// Drops rows already produced, keeping first-seen order.
///
/// Negative ids are never valid rows and are skipped.
#[derive(Debug, Clone)]
pub struct UniqueRowIterator<I> {
    inner: Fuse<I>,
    seen: RoaringBitmap,
}

impl<I: Iterator<Item = Row>> UniqueRowIterator<I> {
    /// Wraps a row iterator.
    pub fn new(inner: I) -> Self {
        Self {
            inner: inner.fuse(),
            seen: RoaringBitmap::new(),
        }
    }
}

impl<I: Iterator<Item = Row>> Iterator for UniqueRowIterator<I> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        let seen = &mut self.seen;
        self.inner
            .find(|&row| u32::try_from(row).is_ok_and(|slot| seen.insert(slot)))
    }
}

impl<I: Iterator<Item = Row>> FusedIterator for UniqueRowIterator<I> {}

/// Rows of a tuple set that satisfy a predicate.
pub struct FilterRowIterator<'a, I> {
    rows: Fuse<I>,
    source: &'a dyn TupleSet,
    predicate: Cow<'a, Expression>,
}

impl<'a, I: Iterator<Item = Row>> FilterRowIterator<'a, I> {
    /// Filters `rows` of `source` by `predicate`.
    pub fn new(rows: I, source: &'a dyn TupleSet, predicate: Cow<'a, Expression>) -> Self {
        Self {
            rows: rows.fuse(),
            source,
            predicate,
        }
    }

    /// The predicate being applied.
    #[must_use]
    pub fn predicate(&self) -> &Expression {
        &self.predicate
    }
}

impl<I: Iterator<Item = Row>> Iterator for FilterRowIterator<'_, I> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        let source = self.source;
        let predicate = &self.predicate;
        self.rows.find(|&row| predicate.matches_row(source, row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.rows.size_hint().1)
    }
}

impl<I: Iterator<Item = Row>> FusedIterator for FilterRowIterator<'_, I> {}

/// Tuples of a tuple set that satisfy a predicate.
pub struct FilterIterator<'a, I> {
    rows: FilterRowIterator<'a, I>,
}

impl<'a, I: Iterator<Item = Row>> FilterIterator<'a, I> {
    /// Filters `rows` of `source` by `predicate`, yielding tuples.
    pub fn new(rows: I, source: &'a dyn TupleSet, predicate: Cow<'a, Expression>) -> Self {
        Self {
            rows: FilterRowIterator::new(rows, source, predicate),
        }
    }
}

impl<'a, I: Iterator<Item = Row>> Iterator for FilterIterator<'a, I> {
    type Item = Tuple<'a>;

    fn next(&mut self) -> Option<Tuple<'a>> {
        let source = self.rows.source;
        self.rows.next().map(|row| Tuple::new(source, row))
    }
}

impl<I: Iterator<Item = Row>> FusedIterator for FilterIterator<'_, I> {}
