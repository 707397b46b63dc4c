//! Tests for `filter_factory` module

use super::filter_factory::*;
use crate::comparator::LiteralComparator;
use crate::expression::{CompareOp, Expression};
use crate::index::{Index, IndexType};
use crate::row_manager::Row;
use crate::table::Table;
use crate::tuple::{RowIter, TupleSet};
use crate::value::{ColumnType, Value};
use std::cell::Cell;

/// People table: row `i` has age `i % 50`, name `n{i % 7}`, active on even rows.
fn people(rows: usize) -> Table {
    let mut table = Table::new();
    table.add_column("age", ColumnType::Int).expect("column");
    table.add_column("score", ColumnType::Double).expect("column");
    table.add_column("name", ColumnType::String).expect("column");
    table.add_column("active", ColumnType::Bool).expect("column");
    for i in 0..rows {
        let row = table.add_row();
        let i = i32::try_from(i).expect("small");
        table.set(row, "age", i % 50).expect("set");
        table.set(row, "score", f64::from(i) / 4.0).expect("set");
        table.set(row, "name", format!("n{}", i % 7)).expect("set");
        table.set(row, "active", i % 2 == 0).expect("set");
    }
    table
}

fn indexed_people(rows: usize) -> Table {
    let mut table = people(rows);
    for column in ["age", "score", "name", "active"] {
        table.create_index(column).expect("index");
    }
    table
}

fn scan(table: &Table, predicate: &Expression) -> Vec<Row> {
    table.rows().filter(|&row| predicate.matches_row(table, row)).collect()
}

fn sorted(mut rows: Vec<Row>) -> Vec<Row> {
    rows.sort_unstable();
    rows
}

/// Forwards to a table while counting index lookups.
struct CountingSet<'a> {
    inner: &'a Table,
    lookups: Cell<usize>,
}

impl TupleSet for CountingSet<'_> {
    fn row_count(&self) -> usize {
        self.inner.row_count()
    }
    fn is_valid_row(&self, row: Row) -> bool {
        self.inner.is_valid_row(row)
    }
    fn rows(&self) -> RowIter<'_> {
        self.inner.rows()
    }
    fn rows_reversed(&self) -> RowIter<'_> {
        self.inner.rows_reversed()
    }
    fn column_count(&self) -> usize {
        self.inner.column_count()
    }
    fn column_name(&self, col: usize) -> Option<&str> {
        self.inner.column_name(col)
    }
    fn column_index(&self, name: &str) -> Option<usize> {
        self.inner.column_index(name)
    }
    fn column_type(&self, col: usize) -> Option<ColumnType> {
        self.inner.column_type(col)
    }
    fn value(&self, row: Row, col: usize) -> Option<Value> {
        self.inner.value(row, col)
    }
    fn column_row(&self, row: Row, col: usize) -> Option<Row> {
        self.inner.column_row(row, col)
    }
    fn table_row(&self, column_row: Row, col: usize) -> Option<Row> {
        self.inner.table_row(column_row, col)
    }
    fn index(&self, name: &str) -> Option<&dyn Index> {
        self.lookups.set(self.lookups.get() + 1);
        self.inner.index(name)
    }
}

// ============================================================================
// Threshold
// ============================================================================

#[test]
fn test_default_threshold() {
    assert_eq!(FilterIteratorFactory::default().optimize_threshold(), 300);
}

#[test]
fn test_small_table_never_consults_indexes() {
    // Arrange
    let table = indexed_people(299);
    let counting = CountingSet {
        inner: &table,
        lookups: Cell::new(0),
    };
    let predicate = Expression::column("age").eq(3);
    let factory = FilterIteratorFactory::default();

    // Act
    let plan = factory.plan(&counting, Some(&predicate));
    let rows: Vec<_> = factory.rows(&counting, Some(&predicate)).collect();

    // Assert
    assert!(!plan.is_optimized());
    assert_eq!(counting.lookups.get(), 0);
    assert_eq!(rows, scan(&table, &predicate));
}

#[test]
fn test_threshold_boundary_optimizes() {
    let table = indexed_people(300);
    let predicate = Expression::column("age").eq(3);

    let plan = FilterIteratorFactory::default().plan(&table, Some(&predicate));

    assert!(plan.is_optimized());
}

#[test]
fn test_no_predicate_returns_every_row() {
    let table = people(5);

    let rows: Vec<_> = FilterIteratorFactory::new(0).rows(&table, None).collect();

    assert_eq!(rows, vec![0, 1, 2, 3, 4]);
}

// ============================================================================
// Plan shapes
// ============================================================================

#[test]
fn test_comparison_plans_index_scan() {
    let table = indexed_people(400);
    let predicate = Expression::column("age").lt(10);

    let plan = FilterIteratorFactory::new(0).plan(&table, Some(&predicate));

    match plan {
        QueryPlan::IndexScan {
            column,
            bounds,
            order,
            ..
        } => {
            assert_eq!(column, "age");
            assert_eq!(bounds, ScanBounds::Int(i32::MIN, 10));
            assert_eq!(order, IndexType::AIE);
        }
        other => panic!("expected index scan, got {other}"),
    }
}

#[test]
fn test_literal_on_left_flips_operator() {
    let table = indexed_people(400);
    let predicate = Expression::comparison(
        CompareOp::Lt,
        Expression::literal(45),
        Expression::column("age"),
    );

    let plan = FilterIteratorFactory::new(0).plan(&table, Some(&predicate));

    assert!(matches!(
        plan,
        QueryPlan::IndexScan { bounds: ScanBounds::Int(45, i32::MAX), order, .. } if order == IndexType::AEI
    ));
}

#[test]
fn test_not_equal_is_scanned() {
    let table = indexed_people(400);
    let predicate = Expression::column("age").ne(3);

    let plan = FilterIteratorFactory::new(0).plan(&table, Some(&predicate));

    assert!(!plan.is_optimized());
}

#[test]
fn test_unindexed_column_is_scanned() {
    let table = people(400);
    let predicate = Expression::column("age").eq(3);

    let plan = FilterIteratorFactory::new(0).plan(&table, Some(&predicate));

    assert_eq!(plan.to_string(), "Scan[age = 3]");
}

#[test]
fn test_inexact_constant_is_scanned() {
    let table = indexed_people(400);
    let predicate = Expression::column("age").lt(2.5);

    let plan = FilterIteratorFactory::new(0).plan(&table, Some(&predicate));

    assert!(!plan.is_optimized());
    assert_eq!(
        FilterIteratorFactory::new(0).rows(&table, Some(&predicate)).collect::<Vec<_>>(),
        scan(&table, &predicate)
    );
}

#[test]
fn test_comparator_mismatch_is_scanned() {
    let table = indexed_people(400);
    let predicate = Expression::column("name")
        .eq("N3")
        .using(LiteralComparator::CaseInsensitive);

    let plan = FilterIteratorFactory::new(0).plan(&table, Some(&predicate));

    assert!(!plan.is_optimized());
}

#[test]
fn test_case_insensitive_index_answers_matching_predicate() {
    let mut table = people(400);
    table
        .create_index_with("name", LiteralComparator::CaseInsensitive)
        .expect("index");
    let predicate = Expression::column("name")
        .eq("N3")
        .using(LiteralComparator::CaseInsensitive);

    let plan = FilterIteratorFactory::new(0).plan(&table, Some(&predicate));
    let rows: Vec<_> = FilterIteratorFactory::new(0).rows(&table, Some(&predicate)).collect();

    assert!(plan.is_optimized());
    assert_eq!(rows, scan(&table, &predicate));
    assert_eq!(rows.len(), 57);
}

#[test]
fn test_bool_column_and_negation_use_bool_index() {
    let table = indexed_people(400);
    let active = Expression::column("active");
    let inactive = Expression::not(Expression::column("active"));
    let factory = FilterIteratorFactory::new(0);

    let on: Vec<_> = factory.rows(&table, Some(&active)).collect();
    let off: Vec<_> = factory.rows(&table, Some(&inactive)).collect();

    assert!(factory.plan(&table, Some(&active)).is_optimized());
    assert_eq!(on.len(), 200);
    assert_eq!(off.len(), 200);
    assert!(on.iter().all(|row| row % 2 == 0));
}

#[test]
fn test_range_plans_bounded_scan() {
    let table = indexed_people(400);
    let predicate = Expression::column("score").between(10, 20);

    let plan = FilterIteratorFactory::new(0).plan(&table, Some(&predicate));

    assert!(matches!(
        plan,
        QueryPlan::IndexScan { bounds: ScanBounds::Double(lo, hi), .. } if lo == 10.0 && hi == 20.0
    ));
}

#[test]
fn test_and_uses_last_optimizable_clause() {
    // Arrange
    let table = indexed_people(400);
    let predicate = Expression::and(vec![
        Expression::column("age").lt(20),
        Expression::column("age").ne(5),
        Expression::column("name").eq("n2"),
        Expression::column("score").ne(1.0),
    ]);

    // Act
    let plan = FilterIteratorFactory::new(0).plan(&table, Some(&predicate));

    // Assert
    match &plan {
        QueryPlan::Residual { input, filter } => {
            assert_eq!(input.indexed_columns(), vec!["name"]);
            assert_eq!(
                filter.to_string(),
                "(age < 20 AND age != 5 AND score != 1)"
            );
        }
        other => panic!("expected residual plan, got {other}"),
    }
}

#[test]
fn test_single_clause_and_is_unwrapped() {
    let table = indexed_people(400);
    let predicate = Expression::and(vec![Expression::column("age").eq(1)]);

    let plan = FilterIteratorFactory::new(0).plan(&table, Some(&predicate));

    assert!(matches!(plan, QueryPlan::IndexScan { .. }));
}

#[test]
fn test_or_needs_every_clause_indexed() {
    let table = indexed_people(400);
    let all_indexed = Expression::or(vec![
        Expression::column("age").eq(1),
        Expression::column("name").eq("n4"),
    ]);
    let partly = Expression::or(vec![
        Expression::column("age").eq(1),
        Expression::column("age").ne(2),
    ]);
    let factory = FilterIteratorFactory::new(0);

    let union = factory.plan(&table, Some(&all_indexed));
    let fallback = factory.plan(&table, Some(&partly));

    assert!(matches!(union, QueryPlan::Union(ref plans) if plans.len() == 2));
    assert_eq!(union.indexed_columns(), vec!["age", "name"]);
    assert!(!fallback.is_optimized());
}

// ============================================================================
// Results
// ============================================================================

#[test]
fn test_union_rows_are_deduplicated() {
    let table = indexed_people(400);
    let predicate = Expression::or(vec![
        Expression::column("age").lt(10),
        Expression::column("age").lt(5),
    ]);

    let rows: Vec<_> = FilterIteratorFactory::new(0).rows(&table, Some(&predicate)).collect();

    assert_eq!(sorted(rows.clone()), scan(&table, &predicate));
    assert_eq!(rows.len(), scan(&table, &predicate).len());
}

#[test]
fn test_optimized_results_match_scan() {
    let table = indexed_people(500);
    let predicates = vec![
        Expression::column("age").ge(42),
        Expression::column("score").gt(100.25),
        Expression::column("name").lt("n3"),
        Expression::column("name").between("n1", "n4"),
        Expression::and(vec![
            Expression::column("active"),
            Expression::column("age").between(10, 12),
        ]),
        Expression::or(vec![
            Expression::column("name").eq("n0"),
            Expression::not(Expression::column("active")),
        ]),
        Expression::range(
            crate::expression::RangeKind::ExEx,
            Expression::literal(30),
            Expression::column("age"),
            Expression::literal(10),
        ),
    ];
    let factory = FilterIteratorFactory::new(0);

    for predicate in &predicates {
        let optimized = sorted(factory.rows(&table, Some(predicate)).collect());
        assert_eq!(optimized, scan(&table, predicate), "{predicate}");
    }
}

#[test]
fn test_tuples_carry_source() {
    let table = indexed_people(400);
    let predicate = Expression::column("age").eq(7);

    let tuples: Vec<_> = FilterIteratorFactory::new(0)
        .tuples(&table, Some(&predicate))
        .collect();

    assert_eq!(tuples.len(), 8);
    assert!(tuples.iter().all(|t| t.get("age") == Some(Value::Int(7))));
}

#[test]
fn test_removed_index_falls_back_to_scan() {
    let mut table = indexed_people(400);
    let predicate = Expression::column("age").eq(7);
    let plan = FilterIteratorFactory::new(0).plan(&table, Some(&predicate)).to_string();

    table.remove_index("age");
    let rows: Vec<_> = table.select(Some(&predicate)).collect();

    assert!(plan.starts_with("IndexScan[age AII"));
    assert_eq!(rows, scan(&table, &predicate));
}
