//! Tests for the normalization registry and the log2 method.

use crate::normalization::{apply_log2, NormalizerRegistry};
use crate::table::{Column, Table};

fn sample_table() -> Table {
  let mut table = Table::new();
  table.push_column(Column::text(
    "analyte",
    vec!["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()],
  ));
  table.push_column(Column::numeric("S1", vec![1.0, 2.0, 4.0, 8.0]));
  table
}

#[test]
fn test_log2_transforms_numeric_cells() {
  let mut table = sample_table();
  assert!(apply_log2(&mut table));
  let values = table.column_by_name("S1").unwrap().as_numeric().unwrap();
  assert_eq!(values, &[0.0, 1.0, 2.0, 3.0]);
}

#[test]
fn test_log2_maps_zero_to_negative_infinity() {
  let mut table = Table::new();
  table.push_column(Column::numeric("S1", vec![0.0, 3.0]));
  apply_log2(&mut table);
  let values = table.column_by_name("S1").unwrap().as_numeric().unwrap();
  assert_eq!(values[0], f64::NEG_INFINITY);
  assert!((values[1] - 1.584962500721156).abs() < 1e-12);
}

#[test]
fn test_log2_leaves_text_columns_alone() {
  let mut table = sample_table();
  apply_log2(&mut table);
  let analytes = table.column_by_name("analyte").unwrap().as_text().unwrap();
  assert_eq!(analytes[0], "a");
}

#[test]
fn test_no_method_leaves_the_table_untouched() {
  let registry = NormalizerRegistry::new();
  let mut table = sample_table();
  let before = table.clone();
  assert!(registry.apply("No", &mut table));
  assert_eq!(table, before);
}

#[test]
fn test_unknown_method_returns_false() {
  let registry = NormalizerRegistry::new();
  let mut table = sample_table();
  let before = table.clone();
  assert!(!registry.apply("Quantile", &mut table));
  assert_eq!(table, before);
}

#[test]
fn test_registration_is_first_wins() {
  let mut registry = NormalizerRegistry::new();
  registry.register("Log2", |_table| false);
  let mut table = sample_table();
  // the built-in Log2 still wins
  assert!(registry.apply("Log2", &mut table));
  assert_eq!(registry.registered_names(), vec!["No", "Log2"]);
}
