//! Predicate planning: turning an expression into index scans.
//!
//! [`FilterIteratorFactory::plan`] inspects the shape of a predicate and the
//! indexes a [`TupleSet`] maintains, and produces a [`QueryPlan`]:
//!
//! - `col` / `NOT col` over a boolean index scans the `true` / `false` rows.
//! - `col <op> constant` (either side, any of `< > = <= >=`) scans a range of
//!   an index whose comparator equals the predicate's. `!=` is never
//!   answered by an index.
//! - `low <op> col <op> high` with constant bounds scans a bounded range.
//! - `AND` answers its last optimizable clause from an index and filters the
//!   result with the remaining clauses.
//! - `OR` is answered from indexes only when every clause is, deduplicating
//!   the union.
//! - Everything else, and every table smaller than the optimization
//!   threshold, is a filtered scan over all rows.
//!
//! A constant is only pushed into an index when it converts exactly to the
//! index's key type, so an optimized plan returns the same rows as a scan.

use std::borrow::Cow;
use std::fmt;

use tracing::trace;

use crate::config::{FilterConfig, DEFAULT_OPTIMIZE_THRESHOLD};
use crate::expression::{CompareOp, Expression, RangeKind};
use crate::index::{Index, IndexType};
use crate::iter::{FilterIterator, FilterRowIterator, UniqueRowIterator};
use crate::tuple::{RowIter, Tuple, TupleSet};
use crate::value::{ColumnType, Value};

/// Key range of an index scan, in the index's key representation.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanBounds {
    /// `i32` range.
    Int(i32, i32),
    /// `i64` range.
    Long(i64, i64),
    /// `f32` range (NaN high bound is open).
    Float(f32, f32),
    /// `f64` range (NaN high bound is open).
    Double(f64, f64),
    /// Object range; `None` is open.
    Object(Option<Value>, Option<Value>),
    /// Rows holding one boolean.
    Bool(bool),
}

impl fmt::Display for ScanBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn open(v: Option<&Value>) -> String {
            v.map_or_else(|| "*".to_string(), ToString::to_string)
        }
        match self {
            Self::Int(lo, hi) => write!(f, "{lo}..{hi}"),
            Self::Long(lo, hi) => write!(f, "{lo}..{hi}"),
            Self::Float(lo, hi) => write!(f, "{lo}..{hi}"),
            Self::Double(lo, hi) => write!(f, "{lo}..{hi}"),
            Self::Object(lo, hi) => write!(f, "{}..{}", open(lo.as_ref()), open(hi.as_ref())),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Execution plan for a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryPlan<'p> {
    /// Every row, filtered by the predicate if there is one.
    Scan {
        /// Row filter.
        predicate: Option<Cow<'p, Expression>>,
    },
    /// Rows from a range of one index.
    IndexScan {
        /// Indexed column.
        column: String,
        /// Key range.
        bounds: ScanBounds,
        /// Direction and bound inclusion.
        order: IndexType,
        /// The clause this scan answers, used if the index disappears.
        clause: Cow<'p, Expression>,
    },
    /// Deduplicated union of sub-plans.
    Union(Vec<QueryPlan<'p>>),
    /// Rows of a sub-plan filtered by the remaining clauses.
    Residual {
        /// Narrowing plan.
        input: Box<QueryPlan<'p>>,
        /// Filter applied to its rows.
        filter: Cow<'p, Expression>,
    },
}

impl<'p> QueryPlan<'p> {
    /// Returns true if the plan uses at least one index.
    #[must_use]
    pub fn is_optimized(&self) -> bool {
        !matches!(self, Self::Scan { .. })
    }

    /// Columns whose indexes the plan reads.
    #[must_use]
    pub fn indexed_columns(&self) -> Vec<&str> {
        match self {
            Self::Scan { .. } => Vec::new(),
            Self::IndexScan { column, .. } => vec![column.as_str()],
            Self::Union(plans) => plans.iter().flat_map(QueryPlan::indexed_columns).collect(),
            Self::Residual { input, .. } => input.indexed_columns(),
        }
    }

    /// Runs the plan.
    pub fn execute<'a>(self, source: &'a dyn TupleSet) -> RowIter<'a>
    where
        'p: 'a,
    {
        match self {
            Self::Scan { predicate: None } => source.rows(),
            Self::Scan {
                predicate: Some(predicate),
            } => Box::new(FilterRowIterator::new(source.rows(), source, predicate)),
            Self::IndexScan {
                column,
                bounds,
                order,
                clause,
            } => match source.index(&column) {
                Some(index) => scan(index, &bounds, order),
                None => {
                    trace!(column = %column, "Index vanished, scanning instead");
                    Box::new(FilterRowIterator::new(source.rows(), source, clause))
                }
            },
            Self::Union(plans) => Box::new(UniqueRowIterator::new(
                plans.into_iter().flat_map(move |plan| plan.execute(source)),
            )),
            Self::Residual { input, filter } => {
                Box::new(FilterRowIterator::new(input.execute(source), source, filter))
            }
        }
    }
}

fn scan<'a>(index: &'a dyn Index, bounds: &ScanBounds, order: IndexType) -> RowIter<'a> {
    match bounds {
        ScanBounds::Int(lo, hi) => index.rows_int(*lo, *hi, order),
        ScanBounds::Long(lo, hi) => index.rows_long(*lo, *hi, order),
        ScanBounds::Float(lo, hi) => index.rows_float(*lo, *hi, order),
        ScanBounds::Double(lo, hi) => index.rows_double(*lo, *hi, order),
        ScanBounds::Object(lo, hi) => index.rows_object(lo.as_ref(), hi.as_ref(), order),
        ScanBounds::Bool(v) => index.rows_bool(*v),
    }
}

impl fmt::Display for QueryPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scan { predicate: None } => f.write_str("Scan"),
            Self::Scan {
                predicate: Some(p),
            } => write!(f, "Scan[{p}]"),
            Self::IndexScan {
                column,
                bounds,
                order,
                ..
            } => write!(f, "IndexScan[{column} {order} {bounds}]"),
            Self::Union(plans) => {
                f.write_str("Union(")?;
                for (i, plan) in plans.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{plan}")?;
                }
                f.write_str(")")
            }
            Self::Residual { input, filter } => write!(f, "Filter[{filter}]({input})"),
        }
    }
}

/// Compiles predicates into index-driven or scanning row iterators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterIteratorFactory {
    optimize_threshold: usize,
}

impl Default for FilterIteratorFactory {
    fn default() -> Self {
        Self {
            optimize_threshold: DEFAULT_OPTIMIZE_THRESHOLD,
        }
    }
}

impl FilterIteratorFactory {
    /// Factory that scans tables smaller than `optimize_threshold` rows.
    #[must_use]
    pub fn new(optimize_threshold: usize) -> Self {
        Self { optimize_threshold }
    }

    /// Factory configured from the `[filter]` section.
    #[must_use]
    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(config.optimize_threshold)
    }

    /// Row count below which indexes are never consulted.
    #[must_use]
    pub fn optimize_threshold(&self) -> usize {
        self.optimize_threshold
    }

    /// Rows of `source` satisfying `predicate` (all rows for `None`).
    pub fn rows<'a>(&self, source: &'a dyn TupleSet, predicate: Option<&'a Expression>) -> RowIter<'a> {
        self.plan(source, predicate).execute(source)
    }

    /// Tuples of `source` satisfying `predicate` (all tuples for `None`).
    pub fn tuples<'a>(
        &self,
        source: &'a dyn TupleSet,
        predicate: Option<&'a Expression>,
    ) -> Box<dyn Iterator<Item = Tuple<'a>> + 'a> {
        match self.plan(source, predicate) {
            QueryPlan::Scan {
                predicate: Some(predicate),
            } => Box::new(FilterIterator::new(source.rows(), source, predicate)),
            plan => Box::new(plan.execute(source).map(move |row| Tuple::new(source, row))),
        }
    }

    /// Chooses how to evaluate `predicate` against `source`.
    pub fn plan<'p>(&self, source: &dyn TupleSet, predicate: Option<&'p Expression>) -> QueryPlan<'p> {
        let Some(predicate) = predicate else {
            return QueryPlan::Scan { predicate: None };
        };
        let rows = source.row_count();
        let optimized = if rows < self.optimize_threshold {
            None
        } else {
            self.optimize(source, predicate)
        };
        let plan = optimized.unwrap_or(QueryPlan::Scan {
            predicate: Some(Cow::Borrowed(predicate)),
        });
        trace!(rows, threshold = self.optimize_threshold, plan = %plan, "Planned predicate");
        plan
    }

    fn optimize<'p>(&self, source: &dyn TupleSet, expr: &'p Expression) -> Option<QueryPlan<'p>> {
        match expr {
            Expression::Column { name } => bool_scan(source, name, true, expr),
            Expression::Not { child } => match child.as_ref() {
                Expression::Column { name } => bool_scan(source, name, false, expr),
                _ => None,
            },
            Expression::Comparison {
                op,
                left,
                right,
                comparator,
            } => {
                let (column, constant, op) = match (left.as_column(), right.as_column()) {
                    (Some(column), _) if !right.has_dependency() => (column, right, *op),
                    (_, Some(column)) if !left.has_dependency() => (column, left, op.flipped()),
                    _ => return None,
                };
                let index = source.index(column)?;
                if index.comparator() != *comparator {
                    return None;
                }
                let key = constant.evaluate_constant().coerce(index.column_type())?;
                let (bounds, order) = comparison_bounds(op, key)?;
                Some(index_scan(column, bounds, order, expr))
            }
            Expression::Range {
                kind,
                low,
                mid,
                high,
                comparator,
            } => {
                let column = mid.as_column()?;
                if low.has_dependency() || high.has_dependency() {
                    return None;
                }
                let index = source.index(column)?;
                if index.comparator() != *comparator {
                    return None;
                }
                let ty = index.column_type();
                let lo = low.evaluate_constant().coerce(ty)?;
                let hi = high.evaluate_constant().coerce(ty)?;
                let bounds = range_bounds(lo, hi)?;
                Some(index_scan(column, bounds, range_order(*kind), expr))
            }
            Expression::And { children } => {
                let (position, plan) = children
                    .iter()
                    .enumerate()
                    .rev()
                    .find_map(|(i, child)| self.optimize(source, child).map(|plan| (i, plan)))?;
                if children.len() == 1 {
                    return Some(plan);
                }
                Some(QueryPlan::Residual {
                    input: Box::new(plan),
                    filter: Cow::Owned(expr.and_without(position)),
                })
            }
            Expression::Or { children } => match children.as_slice() {
                [] => None,
                [only] => self.optimize(source, only),
                _ => children
                    .iter()
                    .map(|child| self.optimize(source, child))
                    .collect::<Option<Vec<_>>>()
                    .map(QueryPlan::Union),
            },
            Expression::Literal { .. } | Expression::Arithmetic { .. } => None,
        }
    }
}

fn index_scan<'p>(
    column: &str,
    bounds: ScanBounds,
    order: IndexType,
    clause: &'p Expression,
) -> QueryPlan<'p> {
    QueryPlan::IndexScan {
        column: column.to_string(),
        bounds,
        order,
        clause: Cow::Borrowed(clause),
    }
}

fn bool_scan<'p>(
    source: &dyn TupleSet,
    column: &str,
    value: bool,
    clause: &'p Expression,
) -> Option<QueryPlan<'p>> {
    let index = source.index(column)?;
    (index.column_type() == ColumnType::Bool)
        .then(|| index_scan(column, ScanBounds::Bool(value), IndexType::AII, clause))
}

/// Bounds of `column <op> key` for a key domain with the given open ends.
fn open_range<T: Copy>(op: CompareOp, key: T, min: T, max: T) -> Option<(T, T, IndexType)> {
    match op {
        CompareOp::Lt => Some((min, key, IndexType::AIE)),
        CompareOp::Gt => Some((key, max, IndexType::AEI)),
        CompareOp::Eq => Some((key, key, IndexType::AII)),
        CompareOp::LtEq => Some((min, key, IndexType::AII)),
        CompareOp::GtEq => Some((key, max, IndexType::AII)),
        CompareOp::NotEq => None,
    }
}

fn comparison_bounds(op: CompareOp, key: Value) -> Option<(ScanBounds, IndexType)> {
    match key {
        Value::Int(k) => open_range(op, k, i32::MIN, i32::MAX)
            .map(|(lo, hi, order)| (ScanBounds::Int(lo, hi), order)),
        Value::Long(k) => open_range(op, k, i64::MIN, i64::MAX)
            .map(|(lo, hi, order)| (ScanBounds::Long(lo, hi), order)),
        Value::Float(k) => open_range(op, k, f32::NEG_INFINITY, f32::NAN)
            .map(|(lo, hi, order)| (ScanBounds::Float(lo, hi), order)),
        Value::Double(k) => open_range(op, k, f64::NEG_INFINITY, f64::NAN)
            .map(|(lo, hi, order)| (ScanBounds::Double(lo, hi), order)),
        Value::String(_) => open_range(op, Some(&key), None, None).map(|(lo, hi, order)| {
            (ScanBounds::Object(lo.cloned(), hi.cloned()), order)
        }),
        Value::Bool(k) if op == CompareOp::Eq => Some((ScanBounds::Bool(k), IndexType::AII)),
        Value::Bool(_) | Value::Null => None,
    }
}

fn range_bounds(lo: Value, hi: Value) -> Option<ScanBounds> {
    match (lo, hi) {
        (Value::Int(lo), Value::Int(hi)) => Some(ScanBounds::Int(lo, hi)),
        (Value::Long(lo), Value::Long(hi)) => Some(ScanBounds::Long(lo, hi)),
        (Value::Float(lo), Value::Float(hi)) => Some(ScanBounds::Float(lo, hi)),
        (Value::Double(lo), Value::Double(hi)) => Some(ScanBounds::Double(lo, hi)),
        (lo @ Value::String(_), hi @ Value::String(_)) => Some(ScanBounds::Object(Some(lo), Some(hi))),
        _ => None,
    }
}

fn range_order(kind: RangeKind) -> IndexType {
    match kind {
        RangeKind::InIn => IndexType::AII,
        RangeKind::InEx => IndexType::AIE,
        RangeKind::ExIn => IndexType::AEI,
        RangeKind::ExEx => IndexType::AEE,
    }
}
