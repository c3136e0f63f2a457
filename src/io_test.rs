//! Tests for delimited import: typing, headers, transpose, and errors.

use crate::error::ImportError;
use crate::io::{read_delimited, ImportSettings};

const CSV: &str = "analyte,S1,S2\nalanine,1.5,2.5\nserine,0.25,4\n";

#[test]
fn test_columns_are_typed_independently() {
  let table = read_delimited(CSV.as_bytes(), &ImportSettings::new()).unwrap();
  assert_eq!(table.column_names(), vec!["analyte", "S1", "S2"]);
  assert!(table.column_by_name("analyte").unwrap().as_text().is_some());
  assert_eq!(
    table.column_by_name("S1").unwrap().as_numeric(),
    Some(&[1.5, 0.25][..])
  );
}

#[test]
fn test_empty_cells_become_nan_in_numeric_columns() {
  let csv = "analyte,S1\na,1\nb,\nc,3\n";
  let table = read_delimited(csv.as_bytes(), &ImportSettings::new()).unwrap();
  let values = table.column_by_name("S1").unwrap().as_numeric().unwrap();
  assert_eq!(values[0], 1.0);
  assert!(values[1].is_nan());
  assert_eq!(values[2], 3.0);
}

#[test]
fn test_mixed_column_stays_text() {
  let csv = "analyte,S1\na,1\nb,n/a\n";
  let table = read_delimited(csv.as_bytes(), &ImportSettings::new()).unwrap();
  let cells = table.column_by_name("S1").unwrap().as_text().unwrap();
  assert_eq!(cells, &["1".to_string(), "n/a".to_string()]);
}

#[test]
fn test_without_headers_columns_are_numbered() {
  let csv = "1,2\n3,4\n";
  let settings = ImportSettings::new().with_headers(false);
  let table = read_delimited(csv.as_bytes(), &settings).unwrap();
  assert_eq!(table.column_names(), vec!["column_0", "column_1"]);
  assert_eq!(table.row_count(), 2);
}

#[test]
fn test_transpose_happens_before_typing() {
  // row-oriented file: samples in rows, analytes in columns
  let csv = "analyte,a,b\nS1,1,2\nS2,3,4\n";
  let settings = ImportSettings::new().with_transpose(true);
  let table = read_delimited(csv.as_bytes(), &settings).unwrap();
  assert_eq!(table.column_names(), vec!["analyte", "S1", "S2"]);
  assert_eq!(
    table.column_by_name("S1").unwrap().as_numeric(),
    Some(&[1.0, 2.0][..])
  );
}

#[test]
fn test_alternate_delimiter() {
  let tsv = "analyte\tS1\na\t1\n";
  let settings = ImportSettings::new().with_delimiter(b'\t');
  let table = read_delimited(tsv.as_bytes(), &settings).unwrap();
  assert_eq!(table.column_names(), vec!["analyte", "S1"]);
}

#[test]
fn test_alternate_quote_character() {
  let csv = "analyte,S1\n'a,b',1\n";
  let settings = ImportSettings::new().with_quote(b'\'');
  let table = read_delimited(csv.as_bytes(), &settings).unwrap();
  let cells = table.column_by_name("analyte").unwrap().as_text().unwrap();
  assert_eq!(cells, &["a,b".to_string()]);
}

#[test]
fn test_ragged_rows_are_padded() {
  let csv = "analyte,S1,S2\na,1\n";
  let table = read_delimited(csv.as_bytes(), &ImportSettings::new()).unwrap();
  assert_eq!(table.column_count(), 3);
  assert!(table.column_by_name("S2").unwrap().as_numeric().unwrap()[0].is_nan());
}

#[test]
fn test_empty_input_is_an_error() {
  let err = read_delimited("".as_bytes(), &ImportSettings::new()).unwrap_err();
  assert!(matches!(err, ImportError::Empty));
}
