//! Predicate and value expressions over table rows.
//!
//! An [`Expression`] is an immutable tree. Evaluation reads column values
//! through a lookup function, so the same tree runs against base tables,
//! cascaded views or plain maps. The planner only inspects trees; it never
//! rewrites them in place.
//!
//! # Example
//!
//! ```rust,ignore
//! use tabula_core::Expression;
//!
//! // (age > 30) AND (name = 'X')
//! let predicate = Expression::and(vec![
//!     Expression::column("age").gt(30),
//!     Expression::column("name").eq("X"),
//! ]);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use crate::comparator::LiteralComparator;
use crate::row_manager::Row;
use crate::tuple::TupleSet;
use crate::value::Value;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `=`
    Eq,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `!=`
    NotEq,
}

impl CompareOp {
    /// Applies the operator to an ordering of `left` relative to `right`.
    #[must_use]
    pub fn test(self, ordering: Ordering) -> bool {
        match self {
            Self::Lt => ordering == Ordering::Less,
            Self::Gt => ordering == Ordering::Greater,
            Self::Eq => ordering == Ordering::Equal,
            Self::LtEq => ordering != Ordering::Greater,
            Self::GtEq => ordering != Ordering::Less,
            Self::NotEq => ordering != Ordering::Equal,
        }
    }

    /// Operator with its operands swapped (`a < b` is `b > a`).
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Lt => Self::Gt,
            Self::Gt => Self::Lt,
            Self::LtEq => Self::GtEq,
            Self::GtEq => Self::LtEq,
            Self::Eq => Self::Eq,
            Self::NotEq => Self::NotEq,
        }
    }

    /// Operator symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Eq => "=",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::NotEq => "!=",
        }
    }
}

/// Bound inclusion of a range predicate `low ? mid ? high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeKind {
    /// `low <= mid <= high`
    InIn,
    /// `low <= mid < high`
    InEx,
    /// `low < mid <= high`
    ExIn,
    /// `low < mid < high`
    ExEx,
}

impl RangeKind {
    /// Returns true if the low bound is included.
    #[must_use]
    pub const fn low_inclusive(self) -> bool {
        matches!(self, Self::InIn | Self::InEx)
    }

    /// Returns true if the high bound is included.
    #[must_use]
    pub const fn high_inclusive(self) -> bool {
        matches!(self, Self::InIn | Self::ExIn)
    }
}

/// Arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
}

impl ArithmeticOp {
    /// Operator symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        }
    }

    fn apply_int(self, a: i64, b: i64) -> Option<i64> {
        match self {
            Self::Add => a.checked_add(b),
            Self::Sub => a.checked_sub(b),
            Self::Mul => a.checked_mul(b),
            Self::Div => a.checked_div(b),
            Self::Mod => a.checked_rem(b),
        }
    }

    fn apply_float(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
            Self::Mod => a % b,
        }
    }

    /// Applies the operator. Non-numeric operands, integer overflow and
    /// integer division by zero produce [`Value::Null`].
    #[must_use]
    pub fn apply(self, left: &Value, right: &Value) -> Value {
        if let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) {
            return match self.apply_int(a, b) {
                Some(v) => match (left, right, i32::try_from(v)) {
                    (Value::Int(_), Value::Int(_), Ok(small)) => Value::Int(small),
                    _ => Value::Long(v),
                },
                None => Value::Null,
            };
        }
        match (left, right) {
            (Value::Float(a), Value::Float(b)) => {
                Value::Float(self.apply_float(f64::from(*a), f64::from(*b)) as f32)
            }
            _ => match (left.as_f64(), right.as_f64()) {
                (Some(a), Some(b)) => Value::Double(self.apply_float(a, b)),
                _ => Value::Null,
            },
        }
    }
}

/// Expression tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expression {
    /// Value of a named column.
    Column {
        /// Column name.
        name: String,
    },
    /// Constant.
    Literal {
        /// Constant value.
        value: Value,
    },
    /// Arithmetic on two operands.
    Arithmetic {
        /// Operator.
        op: ArithmeticOp,
        /// Left operand.
        left: Box<Expression>,
        /// Right operand.
        right: Box<Expression>,
    },
    /// Binary comparison.
    Comparison {
        /// Operator.
        op: CompareOp,
        /// Left operand.
        left: Box<Expression>,
        /// Right operand.
        right: Box<Expression>,
        /// Ordering used to compare the operands.
        #[serde(default)]
        comparator: LiteralComparator,
    },
    /// `low ? mid ? high` with inclusion given by `kind`.
    Range {
        /// Bound inclusion.
        kind: RangeKind,
        /// Low bound.
        low: Box<Expression>,
        /// Tested value.
        mid: Box<Expression>,
        /// High bound.
        high: Box<Expression>,
        /// Ordering used to compare the operands.
        #[serde(default)]
        comparator: LiteralComparator,
    },
    /// Conjunction. Empty is true.
    And {
        /// Clauses.
        children: Vec<Expression>,
    },
    /// Disjunction. Empty is false.
    Or {
        /// Clauses.
        children: Vec<Expression>,
    },
    /// Negation.
    Not {
        /// Negated predicate.
        child: Box<Expression>,
    },
}

#[allow(clippy::should_implement_trait)]
impl Expression {
    /// Column reference.
    #[must_use]
    pub fn column(name: &str) -> Self {
        Self::Column {
            name: name.to_string(),
        }
    }

    /// Constant.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    /// Comparison with the natural comparator.
    #[must_use]
    pub fn comparison(op: CompareOp, left: Self, right: Self) -> Self {
        Self::comparison_with(op, left, right, LiteralComparator::Natural)
    }

    /// Comparison with an explicit comparator.
    #[must_use]
    pub fn comparison_with(
        op: CompareOp,
        left: Self,
        right: Self,
        comparator: LiteralComparator,
    ) -> Self {
        Self::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
            comparator,
        }
    }

    /// Range predicate with the natural comparator.
    #[must_use]
    pub fn range(kind: RangeKind, low: Self, mid: Self, high: Self) -> Self {
        Self::Range {
            kind,
            low: Box::new(low),
            mid: Box::new(mid),
            high: Box::new(high),
            comparator: LiteralComparator::Natural,
        }
    }

    /// Arithmetic expression.
    #[must_use]
    pub fn arithmetic(op: ArithmeticOp, left: Self, right: Self) -> Self {
        Self::Arithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Conjunction.
    #[must_use]
    pub fn and(children: Vec<Self>) -> Self {
        Self::And { children }
    }

    /// Disjunction.
    #[must_use]
    pub fn or(children: Vec<Self>) -> Self {
        Self::Or { children }
    }

    /// Negation.
    #[must_use]
    pub fn not(child: Self) -> Self {
        Self::Not {
            child: Box::new(child),
        }
    }

    /// `self < value`
    #[must_use]
    pub fn lt(self, value: impl Into<Value>) -> Self {
        Self::comparison(CompareOp::Lt, self, Self::literal(value))
    }

    /// `self > value`
    #[must_use]
    pub fn gt(self, value: impl Into<Value>) -> Self {
        Self::comparison(CompareOp::Gt, self, Self::literal(value))
    }

    /// `self = value`
    #[must_use]
    pub fn eq(self, value: impl Into<Value>) -> Self {
        Self::comparison(CompareOp::Eq, self, Self::literal(value))
    }

    /// `self <= value`
    #[must_use]
    pub fn le(self, value: impl Into<Value>) -> Self {
        Self::comparison(CompareOp::LtEq, self, Self::literal(value))
    }

    /// `self >= value`
    #[must_use]
    pub fn ge(self, value: impl Into<Value>) -> Self {
        Self::comparison(CompareOp::GtEq, self, Self::literal(value))
    }

    /// `self != value`
    #[must_use]
    pub fn ne(self, value: impl Into<Value>) -> Self {
        Self::comparison(CompareOp::NotEq, self, Self::literal(value))
    }

    /// `low <= self <= high`
    #[must_use]
    pub fn between(self, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::range(RangeKind::InIn, Self::literal(low), self, Self::literal(high))
    }

    /// Uses `comparator` for this comparison or range. Other nodes are
    /// returned unchanged.
    #[must_use]
    pub fn using(mut self, comparator: LiteralComparator) -> Self {
        match &mut self {
            Self::Comparison { comparator: c, .. } | Self::Range { comparator: c, .. } => {
                *c = comparator;
            }
            _ => {}
        }
        self
    }

    /// Returns true if the expression reads any column.
    #[must_use]
    pub fn has_dependency(&self) -> bool {
        match self {
            Self::Column { .. } => true,
            Self::Literal { .. } => false,
            Self::Arithmetic { left, right, .. } | Self::Comparison { left, right, .. } => {
                left.has_dependency() || right.has_dependency()
            }
            Self::Range { low, mid, high, .. } => {
                low.has_dependency() || mid.has_dependency() || high.has_dependency()
            }
            Self::And { children } | Self::Or { children } => {
                children.iter().any(Self::has_dependency)
            }
            Self::Not { child } => child.has_dependency(),
        }
    }

    /// Names of every column the expression reads.
    #[must_use]
    pub fn columns(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_columns(&mut names);
        names
    }

    fn collect_columns<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Self::Column { name } => {
                names.insert(name);
            }
            Self::Literal { .. } => {}
            Self::Arithmetic { left, right, .. } | Self::Comparison { left, right, .. } => {
                left.collect_columns(names);
                right.collect_columns(names);
            }
            Self::Range { low, mid, high, .. } => {
                low.collect_columns(names);
                mid.collect_columns(names);
                high.collect_columns(names);
            }
            Self::And { children } | Self::Or { children } => {
                for child in children {
                    child.collect_columns(names);
                }
            }
            Self::Not { child } => child.collect_columns(names),
        }
    }

    /// Name of the column if this node is a bare column reference.
    #[must_use]
    pub fn as_column(&self) -> Option<&str> {
        match self {
            Self::Column { name } => Some(name.as_str()),
            _ => None,
        }
    }

    /// Evaluates the expression, reading columns through `lookup`.
    ///
    /// Unknown columns read as [`Value::Null`].
    pub fn evaluate(&self, lookup: &dyn Fn(&str) -> Option<Value>) -> Value {
        match self {
            Self::Column { name } => lookup(name).unwrap_or_default(),
            Self::Literal { value } => value.clone(),
            Self::Arithmetic { op, left, right } => {
                op.apply(&left.evaluate(lookup), &right.evaluate(lookup))
            }
            Self::Comparison {
                op,
                left,
                right,
                comparator,
            } => {
                let ordering = comparator.compare(&left.evaluate(lookup), &right.evaluate(lookup));
                Value::Bool(op.test(ordering))
            }
            Self::Range {
                kind,
                low,
                mid,
                high,
                comparator,
            } => {
                let value = mid.evaluate(lookup);
                let lower = comparator.compare(&low.evaluate(lookup), &value);
                let upper = comparator.compare(&value, &high.evaluate(lookup));
                let above_low = if kind.low_inclusive() {
                    lower != Ordering::Greater
                } else {
                    lower == Ordering::Less
                };
                let below_high = if kind.high_inclusive() {
                    upper != Ordering::Greater
                } else {
                    upper == Ordering::Less
                };
                Value::Bool(above_low && below_high)
            }
            Self::And { children } => Value::Bool(children.iter().all(|c| c.matches(lookup))),
            Self::Or { children } => Value::Bool(children.iter().any(|c| c.matches(lookup))),
            Self::Not { child } => Value::Bool(!child.matches(lookup)),
        }
    }

    /// Returns true if the expression evaluates to `true`.
    pub fn matches(&self, lookup: &dyn Fn(&str) -> Option<Value>) -> bool {
        matches!(self.evaluate(lookup), Value::Bool(true))
    }

    /// Evaluates an expression that reads no columns.
    #[must_use]
    pub fn evaluate_constant(&self) -> Value {
        self.evaluate(&|_| None)
    }

    /// Evaluates against one row of a tuple set.
    #[must_use]
    pub fn evaluate_row(&self, source: &dyn TupleSet, row: Row) -> Value {
        self.evaluate(&|name| source.value_by_name(row, name))
    }

    /// Returns true if the row satisfies the predicate.
    #[must_use]
    pub fn matches_row(&self, source: &dyn TupleSet, row: Row) -> bool {
        self.matches(&|name| source.value_by_name(row, name))
    }

    /// The conjunction without its `skip`-th clause.
    ///
    /// Non-conjunctions are returned unchanged.
    #[must_use]
    pub fn and_without(&self, skip: usize) -> Self {
        match self {
            Self::And { children } => Self::And {
                children: children
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != skip)
                    .map(|(_, c)| c.clone())
                    .collect(),
            },
            other => other.clone(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column { name } => f.write_str(name),
            Self::Literal { value } => write!(f, "{value}"),
            Self::Arithmetic { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            Self::Comparison {
                op, left, right, ..
            } => write!(f, "{left} {} {right}", op.symbol()),
            Self::Range {
                kind,
                low,
                mid,
                high,
                ..
            } => {
                let lo = if kind.low_inclusive() { "<=" } else { "<" };
                let hi = if kind.high_inclusive() { "<=" } else { "<" };
                write!(f, "{low} {lo} {mid} {hi} {high}")
            }
            Self::And { children } => join(f, children, " AND ", "TRUE"),
            Self::Or { children } => join(f, children, " OR ", "FALSE"),
            Self::Not { child } => write!(f, "NOT ({child})"),
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, children: &[Expression], sep: &str, empty: &str) -> fmt::Result {
    if children.is_empty() {
        return f.write_str(empty);
    }
    f.write_str("(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{child}")?;
    }
    f.write_str(")")
}
