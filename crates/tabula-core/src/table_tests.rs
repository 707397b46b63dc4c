//! Tests for `table` module

#[cfg(test)]
mod tests {
    use crate::column::Schema;
    use crate::comparator::LiteralComparator;
    use crate::config::TabulaConfig;
    use crate::error::Error;
    use crate::event::{EventKind, TableEvent};
    use crate::expression::Expression;
    use crate::index::{Index, IndexType};
    use crate::table::*;
    use crate::tuple::TupleSet;
    use crate::value::{ColumnType, Value};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn people() -> Table {
        let schema = Schema::new()
            .with("name", ColumnType::String)
            .with("age", ColumnType::Int)
            .with("score", ColumnType::Double);
        Table::from_schema(&schema).expect("table")
    }

    // ========================================================================
    // Columns and rows
    // ========================================================================

    #[test]
    fn test_new_row_reads_defaults() {
        // Arrange
        let mut table = people();

        // Act
        let row = table.add_row();

        // Assert
        assert_eq!(row, 0);
        assert_eq!(table.get(row, "name"), Ok(Value::Null));
        assert_eq!(table.get_int(row, "age"), Ok(0));
        assert_eq!(table.get_double(row, "score"), Ok(0.0));
    }

    #[test]
    fn test_add_column_after_rows_backfills_defaults() {
        let mut table = people();
        table.add_rows(3);

        let col = table.add_column("active", ColumnType::Bool).expect("column");

        assert_eq!(col, 3);
        assert_eq!(table.get_bool(2, "active"), Ok(false));
    }

    #[test]
    fn test_duplicate_column_is_rejected() {
        let mut table = people();

        let result = table.add_column("age", ColumnType::Long);

        assert_eq!(result, Err(Error::ColumnExists("age".to_string())));
    }

    #[test]
    fn test_removed_row_is_reused_with_fresh_values() {
        let mut table = people();
        let rows = table.add_rows(3);
        table.set(rows[1], "age", 33).expect("set");

        assert!(table.remove_row(rows[1]));
        assert!(!table.remove_row(rows[1]));
        let reused = table.add_row();

        assert_eq!(reused, rows[1]);
        assert_eq!(table.get_int(reused, "age"), Ok(0));
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn test_clear_removes_every_row() {
        let mut table = people();
        table.add_rows(4);

        table.clear();

        assert_eq!(table.row_count(), 0);
        assert!(table.rows().next().is_none());
    }

    // ========================================================================
    // Values
    // ========================================================================

    #[test]
    fn test_set_returns_previous_and_coerces() {
        let mut table = people();
        let row = table.add_row();

        let first = table.set(row, "score", 3).expect("int into double");
        let second = table.set(row, "score", 4.5).expect("double");

        assert_eq!(first, Value::Double(0.0));
        assert_eq!(second, Value::Double(3.0));
        assert_eq!(table.get_double(row, "score"), Ok(4.5));
    }

    #[test]
    fn test_set_type_mismatch_names_column() {
        let mut table = people();
        let row = table.add_row();

        let result = table.set(row, "age", "forty");

        match result {
            Err(Error::TypeMismatch {
                column, expected, ..
            }) => {
                assert_eq!(column, "age");
                assert_eq!(expected, ColumnType::Int);
            }
            other => panic!("expected type mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_row_and_column_errors() {
        let mut table = people();
        table.add_row();

        assert_eq!(table.get(5, "age"), Err(Error::InvalidRow(5)));
        assert_eq!(
            table.get(0, "height"),
            Err(Error::ColumnNotFound("height".to_string()))
        );
        assert_eq!(table.set(9, "age", 1), Err(Error::InvalidRow(9)));
    }

    #[test]
    fn test_typed_getter_rejects_other_type() {
        let mut table = people();
        let row = table.add_row();

        let result = table.get_long(row, "age");

        assert!(matches!(result, Err(Error::TypeMismatch { ref actual, .. }) if actual == "long"));
    }

    #[test]
    fn test_typed_setters() {
        let mut table = people();
        table.add_column("big", ColumnType::Long).expect("column");
        table.add_column("ratio", ColumnType::Float).expect("column");
        table.add_column("flag", ColumnType::Bool).expect("column");
        let row = table.add_row();

        table.set_int(row, "age", 7).expect("int");
        table.set_long(row, "big", 1 << 40).expect("long");
        table.set_float(row, "ratio", 0.25).expect("float");
        table.set_double(row, "score", 9.5).expect("double");
        table.set_bool(row, "flag", true).expect("bool");
        table.set_string(row, "name", Some("Ada")).expect("string");

        assert_eq!(table.get_int(row, "age"), Ok(7));
        assert_eq!(table.get_long(row, "big"), Ok(1 << 40));
        assert_eq!(table.get_float(row, "ratio"), Ok(0.25));
        assert_eq!(table.get_bool(row, "flag"), Ok(true));
        assert_eq!(table.get_string(row, "name"), Ok(Some("Ada".to_string())));

        table.set_string(row, "name", None).expect("null");
        assert_eq!(table.get_string(row, "name"), Ok(None));
    }

    #[test]
    fn test_fill_column_writes_every_row() {
        let mut table = people();
        table.add_rows(3);
        table.remove_row(1);

        table.fill_column("age", 21).expect("fill");

        assert_eq!(table.get_int(0, "age"), Ok(21));
        assert_eq!(table.get_int(2, "age"), Ok(21));
        assert!(table.fill_column("age", "x").is_err());
    }

    #[test]
    fn test_insert_json_populates_row() {
        let mut table = people();

        let row = table
            .insert_json(&json!({"name": "Grace", "age": 85, "score": 1.5}))
            .expect("insert");

        assert_eq!(table.get_string(row, "name"), Ok(Some("Grace".to_string())));
        assert_eq!(table.get_int(row, "age"), Ok(85));
        assert_eq!(table.get_double(row, "score"), Ok(1.5));
    }

    #[test]
    fn test_insert_json_rejects_without_adding() {
        let mut table = people();

        let unknown = table.insert_json(&json!({"height": 2}));
        let mistyped = table.insert_json(&json!({"age": "old"}));
        let not_object = table.insert_json(&json!([1, 2]));

        assert!(matches!(unknown, Err(Error::ColumnNotFound(_))));
        assert!(matches!(mistyped, Err(Error::TypeMismatch { .. })));
        assert!(matches!(not_object, Err(Error::InvalidRecord(_))));
        assert_eq!(table.row_count(), 0);
    }

    // ========================================================================
    // Events and modification count
    // ========================================================================

    #[test]
    fn test_every_mutation_bumps_modification_count() {
        let mut table = people();
        let start = table.modification_count();

        let row = table.add_row();
        let after_add = table.modification_count();
        table.set(row, "age", 1).expect("set");
        let after_set = table.modification_count();
        table.remove_row(row);
        let after_remove = table.modification_count();

        assert!(after_add > start);
        assert!(after_set > after_add);
        assert!(after_remove > after_set);
    }

    #[test]
    fn test_listener_sees_events_in_order() {
        // Arrange
        let mut table = people();
        let log: Rc<RefCell<Vec<(EventKind, i32)>>> = Rc::default();
        let sink = Rc::clone(&log);
        table.add_listener(Box::new(move |_: &dyn TupleSet, event: &TableEvent| {
            sink.borrow_mut().push((event.kind, event.start));
        }));

        // Act
        let row = table.add_row();
        table.set(row, "age", 5).expect("set");
        table.remove_row(row);

        // Assert
        assert_eq!(
            *log.borrow(),
            vec![
                (EventKind::Insert, 0),
                (EventKind::Update, 0),
                (EventKind::Delete, 0)
            ]
        );
    }

    #[test]
    fn test_delete_is_announced_while_row_is_readable() {
        let mut table = people();
        let row = table.add_row();
        table.set(row, "age", 77).expect("set");
        let seen: Rc<RefCell<Option<Value>>> = Rc::default();
        let sink = Rc::clone(&seen);
        table.add_listener(Box::new(move |source: &dyn TupleSet, event: &TableEvent| {
            if event.kind == EventKind::Delete {
                *sink.borrow_mut() = source.value_by_name(event.start, "age");
            }
        }));

        table.remove_row(row);

        assert_eq!(*seen.borrow(), Some(Value::Int(77)));
    }

    #[test]
    fn test_removed_listener_is_not_called() {
        let mut table = people();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let id = table.add_listener(Box::new(move |_: &dyn TupleSet, _: &TableEvent| {
            *sink.borrow_mut() += 1;
        }));
        table.add_row();

        assert!(table.remove_listener(id).is_some());
        table.add_row();

        assert_eq!(*count.borrow(), 1);
    }

    // ========================================================================
    // Indexes
    // ========================================================================

    #[test]
    fn test_create_index_is_idempotent() {
        let mut table = people();
        table.create_index("age").expect("index");
        table.create_index("age").expect("again");

        assert!(table.index("age").is_some());
        assert!(table.remove_index("age"));
        assert!(!table.remove_index("age"));
        assert!(table.index("age").is_none());
    }

    #[test]
    fn test_create_index_with_replaces_comparator() {
        let mut table = people();
        table.create_index("name").expect("natural");

        table
            .create_index_with("name", LiteralComparator::CaseInsensitive)
            .expect("case-insensitive");

        let index = table.index("name").expect("index");
        assert_eq!(index.comparator(), LiteralComparator::CaseInsensitive);
    }

    #[test]
    fn test_create_index_with_incompatible_comparator_fails() {
        let mut table = people();

        let result = table.create_index_with("age", LiteralComparator::CaseInsensitive);

        assert!(matches!(result, Err(Error::IncompatibleComparator { .. })));
        assert!(table.index("age").is_none());
    }

    #[test]
    fn test_auto_index_and_default_comparator_from_config() {
        // Arrange
        let config = TabulaConfig::from_toml(
            r#"
[index]
default_comparator = "case_insensitive"
auto_index_columns = ["name", "age"]
"#,
        )
        .expect("config");

        // Act
        let mut table = Table::with_config(&config);
        table.add_column("name", ColumnType::String).expect("column");
        table.add_column("age", ColumnType::Int).expect("column");

        // Assert
        let name = table.index("name").expect("auto index on name");
        let age = table.index("age").expect("auto index on age");
        assert_eq!(name.comparator(), LiteralComparator::CaseInsensitive);
        assert_eq!(age.comparator(), LiteralComparator::Natural);
    }

    #[test]
    fn test_index_follows_row_reuse() {
        let mut table = people();
        table.create_index("age").expect("index");
        let rows = table.add_rows(3);
        for (i, &row) in rows.iter().enumerate() {
            table.set(row, "age", i32::try_from(i).expect("small") * 10).expect("set");
        }

        table.remove_row(rows[1]);
        let reused = table.add_row();
        table.set(reused, "age", 15).expect("set");

        let index = table.index("age").expect("index");
        let ordered: Vec<_> = index.all_rows(IndexType::AII).collect();
        assert_eq!(ordered, vec![0, 1, 2]);
        assert_eq!(index.rows_int(10, 10, IndexType::AII).count(), 0);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[test]
    fn test_select_matches_scan_with_and_without_index() {
        let mut table = people();
        table.set_optimize_threshold(0);
        for age in [30, 12, 45, 30, 8] {
            let row = table.add_row();
            table.set(row, "age", age).expect("set");
        }
        let predicate = Expression::column("age").ge(30);

        let scanned: Vec<_> = table.select(Some(&predicate)).collect();
        table.create_index("age").expect("index");
        let indexed: Vec<_> = table.select(Some(&predicate)).collect();

        assert_eq!(scanned, vec![0, 2, 3]);
        assert_eq!(indexed, vec![0, 3, 2]);
        assert!(table.explain(Some(&predicate)).is_optimized());
    }

    #[test]
    fn test_debug_lists_indexes() {
        let mut table = people();
        table.create_index("age").expect("index");

        let debug = format!("{table:?}");

        assert!(debug.contains("age"));
        assert!(debug.contains("modifications"));
    }
}
