//! Tests for typed tables and spreadsheet-style column ranges.

use crate::table::{parse_column_range, Column, Table};

fn sample_table() -> Table {
  let mut table = Table::new();
  table.push_column(Column::text(
    "analyte",
    vec!["alanine".to_string(), "serine".to_string()],
  ));
  table.push_column(Column::numeric("S1", vec![1.0, 2.0]));
  table.push_column(Column::numeric("S2", vec![3.0, 4.0]));
  table
}

#[test]
fn test_push_column_rejects_mismatched_length() {
  let mut table = sample_table();
  table.push_column(Column::numeric("bad", vec![1.0]));
  assert_eq!(table.column_count(), 3);
}

#[test]
fn test_row_and_column_counts() {
  let table = sample_table();
  assert_eq!(table.row_count(), 2);
  assert_eq!(table.column_count(), 3);
  assert_eq!(table.column_names(), vec!["analyte", "S1", "S2"]);
}

#[test]
fn test_column_by_name() {
  let table = sample_table();
  let column = table.column_by_name("S2").unwrap();
  assert_eq!(column.as_numeric(), Some(&[3.0, 4.0][..]));
  assert!(table.column_by_name("missing").is_none());
}

#[test]
fn test_cell_to_string() {
  let table = sample_table();
  assert_eq!(table.column(0).unwrap().cell_to_string(1), "serine");
  assert_eq!(table.column(1).unwrap().cell_to_string(0), "1");
}

#[test]
fn test_transpose_with_row_header() {
  let transposed = sample_table().transpose_with_row_header().unwrap();
  // samples become rows, analytes become columns
  assert_eq!(transposed.column_names(), vec!["header", "alanine", "serine"]);
  assert_eq!(transposed.row_count(), 2);
  let alanine = transposed.column_by_name("alanine").unwrap();
  assert_eq!(alanine.as_numeric(), Some(&[1.0, 3.0][..]));
}

#[test]
fn test_parse_column_range_single_letters() {
  assert_eq!(parse_column_range("A,C"), Some(vec![0, 2]));
}

#[test]
fn test_parse_column_range_spans() {
  assert_eq!(parse_column_range("A-C,F"), Some(vec![0, 1, 2, 5]));
  assert_eq!(parse_column_range("D,E,G-J"), Some(vec![3, 4, 6, 7, 8, 9]));
}

#[test]
fn test_parse_column_range_collapses_repeats() {
  // a column named twice, even non-adjacently, counts once
  assert_eq!(parse_column_range("A,B,A"), Some(vec![0, 1]));
  assert_eq!(parse_column_range("A-C,B"), Some(vec![0, 1, 2]));
}

#[test]
fn test_parse_column_range_rejects_garbage() {
  assert_eq!(parse_column_range(""), None);
  assert_eq!(parse_column_range("A-"), None);
  assert_eq!(parse_column_range("1,2"), None);
  assert_eq!(parse_column_range("C-A"), None);
}
