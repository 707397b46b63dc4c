//! Tests for `filtered_rows` module

use super::filtered_rows::*;
use crate::row_manager::Row;
use crate::tuple::{RowIter, TupleSet};
use crate::value::{ColumnType, Value};

/// Parent whose storage rows are offset from its table rows.
struct ShiftedParent {
    rows: Vec<Row>,
}

impl TupleSet for ShiftedParent {
    fn row_count(&self) -> usize {
        self.rows.len()
    }
    fn is_valid_row(&self, row: Row) -> bool {
        self.rows.contains(&row)
    }
    fn rows(&self) -> RowIter<'_> {
        Box::new(self.rows.iter().copied())
    }
    fn rows_reversed(&self) -> RowIter<'_> {
        Box::new(self.rows.iter().rev().copied())
    }
    fn column_count(&self) -> usize {
        2
    }
    fn column_name(&self, col: usize) -> Option<&str> {
        ["a", "b"].get(col).copied()
    }
    fn column_index(&self, name: &str) -> Option<usize> {
        ["a", "b"].iter().position(|c| *c == name)
    }
    fn column_type(&self, _col: usize) -> Option<ColumnType> {
        Some(ColumnType::Int)
    }
    fn value(&self, row: Row, _col: usize) -> Option<Value> {
        self.is_valid_row(row).then_some(Value::Int(row))
    }
    fn column_row(&self, row: Row, _col: usize) -> Option<Row> {
        self.is_valid_row(row).then_some(row + 100)
    }
    fn table_row(&self, column_row: Row, _col: usize) -> Option<Row> {
        let row = column_row - 100;
        self.is_valid_row(row).then_some(row)
    }
}

#[test]
fn test_add_row_records_both_directions() {
    // Arrange
    let mut rows = FilteredRowManager::new();

    // Act
    let a = rows.add_row(10);
    let b = rows.add_row(20);

    // Assert
    assert_eq!((a, b), (0, 1));
    assert_eq!(rows.parent_row(a), Some(10));
    assert_eq!(rows.child_row(20), Some(b));
    assert_eq!(rows.row_count(), 2);
}

#[test]
fn test_add_row_for_mapped_parent_returns_existing_child() {
    let mut rows = FilteredRowManager::new();
    let first = rows.add_row(7);

    let again = rows.add_row(7);

    assert_eq!(first, again);
    assert_eq!(rows.row_count(), 1);
}

#[test]
fn test_release_row_removes_both_directions() {
    // Arrange
    let mut rows = FilteredRowManager::new();
    let child = rows.add_row(5);
    rows.add_row(6);

    // Act
    let released = rows.release_row(child);

    // Assert
    assert!(released);
    assert_eq!(rows.parent_row(child), None);
    assert_eq!(rows.child_row(5), None);
    assert!(!rows.release_row(child));
}

#[test]
fn test_released_child_slot_is_remapped() {
    let mut rows = FilteredRowManager::new();
    rows.add_row(1);
    let middle = rows.add_row(2);
    rows.add_row(3);
    rows.release_row(middle);

    let reused = rows.add_row(9);

    assert_eq!(reused, middle);
    assert_eq!(rows.parent_row(reused), Some(9));
    assert_eq!(rows.child_row(2), None);
}

#[test]
fn test_put_replaces_previous_association() {
    let mut rows = FilteredRowManager::new();
    let child = rows.add_row(1);

    assert!(rows.put(child, 4));

    assert_eq!(rows.parent_row(child), Some(4));
    assert_eq!(rows.child_row(1), None);
    assert_eq!(rows.parent_rows().collect::<Vec<_>>(), vec![4]);
}

#[test]
fn test_put_ignores_unallocated_child() {
    // Arrange
    let mut rows = FilteredRowManager::new();
    let child = rows.add_row(1);
    let released = rows.add_row(2);
    rows.release_row(released);

    // Act
    let stale = rows.put(released, 7);
    let unknown = rows.put(40, 8);
    let negative = rows.put(-1, 9);

    // Assert
    assert!(!stale && !unknown && !negative);
    for parent in [7, 8, 9] {
        assert_eq!(rows.child_row(parent), None);
    }
    assert_eq!(rows.parent_row(released), None);
    assert_eq!(rows.parent_rows().collect::<Vec<_>>(), vec![1]);
    assert_eq!(rows.child_row(1), Some(child));
}

#[test]
fn test_mapping_invariant_after_mixed_operations() {
    let mut rows = FilteredRowManager::new();
    for parent in 0..20 {
        rows.add_row(parent * 3);
    }
    for child in (0..20).step_by(3) {
        rows.release_row(child);
    }
    rows.add_row(1000);

    for child in rows.manager().rows() {
        let parent = rows.parent_row(child).expect("mapped");
        assert_eq!(rows.child_row(parent), Some(child));
    }
}

#[test]
fn test_clear_drops_mappings() {
    let mut rows = FilteredRowManager::new();
    rows.add_row(3);

    rows.clear();

    assert_eq!(rows.row_count(), 0);
    assert_eq!(rows.child_row(3), None);
}

#[test]
fn test_cascaded_local_columns_use_own_rows() {
    // Arrange
    let parent = ShiftedParent { rows: vec![0, 1, 2] };
    let mut cascaded = CascadedRowManager::new();
    cascaded.push_inherited(1);
    let local = cascaded.push_local();
    let child = cascaded.filtered_mut().add_row(2);

    // Act & Assert
    assert_eq!(cascaded.column_row(child, local, &parent), Some(child));
    assert_eq!(cascaded.table_row(child, local, &parent), Some(child));
    assert_eq!(cascaded.source(local), Some(ColumnSource::Local(0)));
}

#[test]
fn test_cascaded_inherited_columns_delegate_to_parent() {
    // Arrange
    let parent = ShiftedParent { rows: vec![0, 1, 2] };
    let mut cascaded = CascadedRowManager::new();
    let inherited = cascaded.push_inherited(1);
    cascaded.filtered_mut().add_row(0);
    let child = cascaded.filtered_mut().add_row(2);

    // Act
    let storage_row = cascaded.column_row(child, inherited, &parent);

    // Assert
    assert_eq!(storage_row, Some(102));
    assert_eq!(cascaded.table_row(102, inherited, &parent), Some(child));
    assert_eq!(cascaded.table_row(101, inherited, &parent), None);
    assert_eq!(cascaded.column_row(child, 5, &parent), None);
}
