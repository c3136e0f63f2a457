//! # Delimited Import
//!
//! Reads delimited text files (CSV by default) into typed [`Table`]s.
//! The raw grid is read first; an optional transpose is applied to the
//! grid before any typing, then each column is classified independently:
//! a column whose non-empty cells all parse as `f64` becomes numeric
//! (empty cells become `NaN`), anything else stays text. Header cells
//! name the columns; without headers the columns are named
//! `column_0`, `column_1`, ...

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::ImportError;
use crate::table::{Column, Table};

/// Options controlling a delimited import.
#[derive(Debug, Clone)]
pub struct ImportSettings {
  delimiter: u8,
  quote: u8,
  has_headers: bool,
  transpose: bool,
}

impl Default for ImportSettings {
  fn default() -> Self {
    Self {
      delimiter: b',',
      quote: b'"',
      has_headers: true,
      transpose: false,
    }
  }
}

impl ImportSettings {
  /// Creates the default settings: comma-delimited, with headers, no
  /// transpose.
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the field delimiter byte.
  pub fn with_delimiter(mut self, delimiter: u8) -> Self {
    self.delimiter = delimiter;
    self
  }

  /// Sets the quote character byte.
  pub fn with_quote(mut self, quote: u8) -> Self {
    self.quote = quote;
    self
  }

  /// Sets whether the first row names the columns.
  pub fn with_headers(mut self, has_headers: bool) -> Self {
    self.has_headers = has_headers;
    self
  }

  /// Sets whether the raw grid is transposed before typing.
  pub fn with_transpose(mut self, transpose: bool) -> Self {
    self.transpose = transpose;
    self
  }
}

/// Reads a delimited file into a typed table.
pub fn read_delimited_file(
  path: impl AsRef<Path>,
  settings: &ImportSettings,
) -> Result<Table, ImportError> {
  let file = File::open(path)?;
  read_delimited(file, settings)
}

/// Reads delimited text from any reader into a typed table.
pub fn read_delimited(reader: impl Read, settings: &ImportSettings) -> Result<Table, ImportError> {
  let mut csv_reader = csv::ReaderBuilder::new()
    .delimiter(settings.delimiter)
    .quote(settings.quote)
    .has_headers(false)
    .flexible(true)
    .from_reader(reader);

  let mut grid: Vec<Vec<String>> = Vec::new();
  for record in csv_reader.records() {
    let record = record?;
    grid.push(record.iter().map(str::to_string).collect());
  }
  if grid.is_empty() {
    return Err(ImportError::Empty);
  }
  // ragged rows are padded so the grid is rectangular before typing
  let width = grid.iter().map(Vec::len).max().unwrap_or(0);
  for row in &mut grid {
    row.resize(width, String::new());
  }
  if settings.transpose {
    grid = transpose_grid(grid);
  }

  let cols = grid.first().map(Vec::len).unwrap_or(0);
  let (names, rows) = if settings.has_headers {
    let mut iter = grid.into_iter();
    let header = iter.next().unwrap_or_default();
    (header, iter.collect::<Vec<_>>())
  } else {
    let names = (0..cols).map(|i| format!("column_{i}")).collect();
    (names, grid)
  };

  let mut table = Table::new();
  for (index, name) in names.iter().enumerate() {
    let cells: Vec<&str> = rows.iter().map(|r| r[index].as_str()).collect();
    table.push_column(classify_column(name, &cells));
  }
  Ok(table)
}

fn transpose_grid(grid: Vec<Vec<String>>) -> Vec<Vec<String>> {
  let rows = grid.len();
  let cols = grid.first().map(Vec::len).unwrap_or(0);
  let mut out = vec![vec![String::new(); rows]; cols];
  for (r, row) in grid.into_iter().enumerate() {
    for (c, cell) in row.into_iter().enumerate() {
      out[c][r] = cell;
    }
  }
  out
}

/// Classifies one column: numeric when every non-empty cell parses as
/// `f64` (empty cells become `NaN`), text otherwise.
fn classify_column(name: &str, cells: &[&str]) -> Column {
  let mut values = Vec::with_capacity(cells.len());
  let mut numeric = true;
  for cell in cells {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
      values.push(f64::NAN);
      continue;
    }
    match trimmed.parse::<f64>() {
      Ok(v) => values.push(v),
      Err(_) => {
        numeric = false;
        break;
      }
    }
  }
  if numeric {
    Column::numeric(name, values)
  } else {
    Column::text(name, cells.iter().map(|c| c.trim().to_string()).collect())
  }
}
