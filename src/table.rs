//! # Tabular Values
//!
//! This module provides [`Table`], the column-major tabular value carried by
//! data objects throughout the workbench: delimited-text imports produce one,
//! analyses consume and produce them, and table views render them.
//!
//! ## Overview
//!
//! A [`Table`] is an ordered list of equally long named columns, each either
//! [`Column::Numeric`] or [`Column::Text`]. The first column of an imported
//! 'omics table conventionally holds the analyte names (the "header column");
//! several analyses rely on [`Table::transpose_with_row_header`] to flip
//! samples and analytes while keeping that convention intact.
//!
//! # Example
//!
//! ```rust
//! use omics_workbench::table::{Column, Table};
//!
//! let mut table = Table::new();
//! table.push_column(Column::text("analyte", vec!["alanine".into(), "serine".into()]));
//! table.push_column(Column::numeric("S1", vec![1.5, 0.25]));
//! assert_eq!(table.row_count(), 2);
//! ```

/// A single named table column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
  /// Dense numeric column; missing cells are `NaN`.
  Numeric {
    /// Column name.
    name: String,
    /// Cell values, one per row.
    values: Vec<f64>,
  },
  /// Text column.
  Text {
    /// Column name.
    name: String,
    /// Cell values, one per row.
    values: Vec<String>,
  },
}

impl Column {
  /// Creates a numeric column.
  pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
    Column::Numeric {
      name: name.into(),
      values,
    }
  }

  /// Creates a text column.
  pub fn text(name: impl Into<String>, values: Vec<String>) -> Self {
    Column::Text {
      name: name.into(),
      values,
    }
  }

  /// Returns the column name.
  pub fn name(&self) -> &str {
    match self {
      Column::Numeric { name, .. } | Column::Text { name, .. } => name,
    }
  }

  /// Returns the number of rows in the column.
  pub fn len(&self) -> usize {
    match self {
      Column::Numeric { values, .. } => values.len(),
      Column::Text { values, .. } => values.len(),
    }
  }

  /// Returns `true` when the column has no rows.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Returns the numeric values, or `None` for a text column.
  pub fn as_numeric(&self) -> Option<&[f64]> {
    match self {
      Column::Numeric { values, .. } => Some(values),
      Column::Text { .. } => None,
    }
  }

  /// Returns the text values, or `None` for a numeric column.
  pub fn as_text(&self) -> Option<&[String]> {
    match self {
      Column::Text { values, .. } => Some(values),
      Column::Numeric { .. } => None,
    }
  }

  /// Renders one cell as a display string.
  pub fn cell_to_string(&self, row: usize) -> String {
    match self {
      Column::Numeric { values, .. } => values
        .get(row)
        .map(|v| v.to_string())
        .unwrap_or_default(),
      Column::Text { values, .. } => values.get(row).cloned().unwrap_or_default(),
    }
  }
}

/// A column-major table of named, typed columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
  columns: Vec<Column>,
}

impl Table {
  /// Creates an empty table.
  pub fn new() -> Self {
    Self {
      columns: Vec::new(),
    }
  }

  /// Appends a column.
  ///
  /// The first column fixes the row count; later columns whose length does
  /// not match are rejected with a warning and the table is left unchanged.
  pub fn push_column(&mut self, column: Column) {
    if let Some(first) = self.columns.first() {
      if first.len() != column.len() {
        tracing::warn!(
          column = column.name(),
          expected = first.len(),
          actual = column.len(),
          "rejecting column with mismatched row count"
        );
        return;
      }
    }
    self.columns.push(column);
  }

  /// Returns the number of columns.
  pub fn column_count(&self) -> usize {
    self.columns.len()
  }

  /// Returns the number of rows.
  pub fn row_count(&self) -> usize {
    self.columns.first().map(Column::len).unwrap_or(0)
  }

  /// Returns the column at `index`.
  pub fn column(&self, index: usize) -> Option<&Column> {
    self.columns.get(index)
  }

  /// Returns the column with the given name.
  pub fn column_by_name(&self, name: &str) -> Option<&Column> {
    self.columns.iter().find(|c| c.name() == name)
  }

  /// Returns a mutable reference to the column at `index`.
  pub fn column_mut(&mut self, index: usize) -> Option<&mut Column> {
    self.columns.get_mut(index)
  }

  /// Iterates over the columns in order.
  pub fn columns(&self) -> impl Iterator<Item = &Column> {
    self.columns.iter()
  }

  /// Iterates mutably over the columns in order.
  pub fn columns_mut(&mut self) -> impl Iterator<Item = &mut Column> {
    self.columns.iter_mut()
  }

  /// Returns the ordered column names.
  pub fn column_names(&self) -> Vec<&str> {
    self.columns.iter().map(Column::name).collect()
  }

  /// Transposes the table, treating the first (text) column as row headers.
  ///
  /// The header column's cells become the names of the transposed data
  /// columns, and the original data column names become a new leading text
  /// column named `header`. Returns `None` when the table is empty or its
  /// first column is not text.
  pub fn transpose_with_row_header(&self) -> Option<Table> {
    let header = self.columns.first()?.as_text()?;
    let mut transposed = Table::new();

    let names: Vec<String> = self
      .columns
      .iter()
      .skip(1)
      .map(|c| c.name().to_string())
      .collect();
    transposed.push_column(Column::text("header", names));

    for (row, row_name) in header.iter().enumerate() {
      let values: Vec<String> = self
        .columns
        .iter()
        .skip(1)
        .map(|c| c.cell_to_string(row))
        .collect();
      // Re-detect numeric content per transposed column.
      if values
        .iter()
        .all(|v| v.is_empty() || v.parse::<f64>().is_ok())
      {
        let numeric = values
          .iter()
          .map(|v| v.parse::<f64>().unwrap_or(f64::NAN))
          .collect();
        transposed.push_column(Column::numeric(row_name.clone(), numeric));
      } else {
        transposed.push_column(Column::text(row_name.clone(), values));
      }
    }
    Some(transposed)
  }
}

/// Parses a spreadsheet-style column range string such as `"A-C,F"` into
/// zero-based column offsets.
///
/// Ranges are inclusive, case-insensitive, and may mix single letters and
/// spans; whitespace is ignored and duplicates are collapsed. Returns `None`
/// for anything that does not match the `LETTERS[-LETTERS]` comma list form.
pub fn parse_column_range(range: &str) -> Option<Vec<usize>> {
  fn letters_to_offset(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
      return None;
    }
    let mut value = 0usize;
    for c in letters.chars() {
      value = value * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some(value - 1)
  }

  let cleaned: String = range.chars().filter(|c| !c.is_whitespace()).collect();
  if cleaned.is_empty() {
    return None;
  }

  let mut offsets = Vec::new();
  for part in cleaned.split(',') {
    match part.split_once('-') {
      Some((lo, hi)) => {
        let lo = letters_to_offset(lo)?;
        let hi = letters_to_offset(hi)?;
        if hi < lo {
          return None;
        }
        offsets.extend(lo..=hi);
      }
      None => offsets.push(letters_to_offset(part)?),
    }
  }
  let mut seen = std::collections::HashSet::new();
  offsets.retain(|offset| seen.insert(*offset));
  Some(offsets)
}
