//! Tests for `value` and `comparator` modules

use super::comparator::LiteralComparator;
use super::value::*;
use std::cmp::Ordering;

// -------------------------------------------------------------------------
// Ordering
// -------------------------------------------------------------------------

#[test]
fn test_cross_family_order() {
    let mut values = vec![
        Value::from("a"),
        Value::Double(1.5),
        Value::Bool(true),
        Value::Null,
        Value::Int(-3),
    ];

    values.sort();

    assert_eq!(
        values,
        vec![
            Value::Null,
            Value::Bool(true),
            Value::Int(-3),
            Value::Double(1.5),
            Value::from("a"),
        ]
    );
}

#[test]
fn test_numeric_kinds_compare_numerically() {
    assert_eq!(Value::Int(5), Value::Double(5.0));
    assert_eq!(Value::Long(5), Value::Float(5.0));
    assert!(Value::Int(5) < Value::Double(5.5));
    assert!(Value::Int(-5) > Value::Double(-5.5));
    assert!(Value::Long(i64::MAX) < Value::Double(9.3e18));
}

#[test]
fn test_large_long_vs_double_is_exact() {
    // 2^53 + 1 is not representable as f64
    let big = (1_i64 << 53) + 1;
    let rounded = Value::Double((1_i64 << 53) as f64);

    assert_eq!(Value::Long(big).cmp(&rounded), Ordering::Greater);
    assert_ne!(Value::Long(big), rounded);
}

#[test]
fn test_nan_sorts_after_numbers() {
    assert!(Value::Double(f64::NAN) > Value::Double(f64::INFINITY));
    assert!(Value::Double(f64::NAN) > Value::Long(i64::MAX));
    assert_eq!(Value::Double(f64::NAN), Value::Float(f32::NAN));
}

#[test]
fn test_ordered_float_nan_last() {
    let mut keys = vec![
        OrderedFloat(f32::NAN),
        OrderedFloat(1.0_f32),
        OrderedFloat(f32::NEG_INFINITY),
    ];

    keys.sort();

    assert_eq!(keys[0], OrderedFloat(f32::NEG_INFINITY));
    assert_eq!(keys[1], OrderedFloat(1.0));
    assert!(keys[2].0.is_nan());
}

// -------------------------------------------------------------------------
// Coercion
// -------------------------------------------------------------------------

#[test]
fn test_coerce_exact_integral() {
    assert_eq!(Value::Long(7).coerce(ColumnType::Int), Some(Value::Int(7)));
    assert_eq!(Value::Double(7.0).coerce(ColumnType::Int), Some(Value::Int(7)));
    assert_eq!(Value::Double(7.5).coerce(ColumnType::Int), None);
    assert_eq!(Value::Long(i64::MAX).coerce(ColumnType::Int), None);
    assert_eq!(Value::Double(f64::NAN).coerce(ColumnType::Long), None);
}

#[test]
fn test_coerce_exact_float() {
    assert_eq!(Value::Int(3).coerce(ColumnType::Float), Some(Value::Float(3.0)));
    assert_eq!(Value::Double(0.5).coerce(ColumnType::Float), Some(Value::Float(0.5)));
    assert_eq!(Value::Double(0.1).coerce(ColumnType::Float), None);
    assert_eq!(Value::Long(i64::MAX).coerce(ColumnType::Float), None);
    assert_eq!(Value::Float(0.1).coerce(ColumnType::Double), Some(Value::Double(f64::from(0.1_f32))));
}

#[test]
fn test_coerce_rejects_other_families() {
    assert_eq!(Value::Null.coerce(ColumnType::String), None);
    assert_eq!(Value::from("1").coerce(ColumnType::Int), None);
    assert_eq!(Value::Int(1).coerce(ColumnType::Bool), None);
    assert_eq!(Value::Bool(true).coerce(ColumnType::Bool), Some(Value::Bool(true)));
}

// -------------------------------------------------------------------------
// JSON and serde
// -------------------------------------------------------------------------

#[test]
fn test_from_json_scalars() {
    assert_eq!(Value::from_json(&serde_json::json!(12)), Some(Value::Int(12)));
    assert_eq!(
        Value::from_json(&serde_json::json!(5_000_000_000_i64)),
        Some(Value::Long(5_000_000_000))
    );
    assert_eq!(Value::from_json(&serde_json::json!(2.5)), Some(Value::Double(2.5)));
    assert_eq!(Value::from_json(&serde_json::json!(null)), Some(Value::Null));
    assert_eq!(Value::from_json(&serde_json::json!([1, 2])), None);
}

#[test]
fn test_value_serde_tagged() {
    let json = serde_json::to_string(&Value::Int(4)).expect("serialize");

    assert_eq!(json, r#"{"type":"int","value":4}"#);
    let back: Value = serde_json::from_str(&json).expect("deserialize");
    assert!(matches!(back, Value::Int(4)));
}

// -------------------------------------------------------------------------
// Comparators
// -------------------------------------------------------------------------

#[test]
fn test_case_insensitive_comparator() {
    let cmp = LiteralComparator::CaseInsensitive;

    assert_eq!(cmp.compare(&"Alice".into(), &"alice".into()), Ordering::Equal);
    assert_eq!(LiteralComparator::Natural.compare(&"Alice".into(), &"alice".into()), Ordering::Less);
    assert!(cmp.supports(ColumnType::String));
    assert!(!cmp.supports(ColumnType::Int));
    assert_eq!(cmp.string_key("MiXeD"), "mixed");
}
