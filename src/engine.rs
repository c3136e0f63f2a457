//! # Statistics Engine Seam
//!
//! This module defines [`StatsEngine`], the async trait through which every
//! analysis reaches the external statistics runtime, plus the dense
//! [`ArrayValue`]/[`Matrix`] values exchanged across that seam and the
//! table ↔ array conversions the analysis layer is responsible for.
//!
//! ## Overview
//!
//! An engine call is one logical unit of work: a script string, a set of
//! named input arrays, and the set of output array names the caller wants
//! back. The engine either returns every requested array or an error; a
//! missing array in an otherwise successful response is surfaced by
//! [`require_array`] as [`EngineError::MissingArray`]. From the calling
//! analysis's point of view the call is synchronous; the await point only
//! suspends cooperatively while the runtime works.
//!
//! Statistical correctness of what the engine computes is out of scope
//! here; tests exercise the pipeline with hand-rolled fake engines.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::table::{Column, Table};

/// A dense, row-major numeric matrix with optional row/column labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matrix {
  rows: usize,
  cols: usize,
  data: Vec<f64>,
  row_labels: Vec<String>,
  col_labels: Vec<String>,
}

impl Matrix {
  /// Creates a matrix from row-major data.
  ///
  /// Returns `None` when `data.len() != rows * cols`.
  pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Option<Self> {
    if data.len() != rows * cols {
      return None;
    }
    Some(Self {
      rows,
      cols,
      data,
      row_labels: Vec::new(),
      col_labels: Vec::new(),
    })
  }

  /// Attaches row labels (one per row).
  pub fn with_row_labels(mut self, labels: Vec<String>) -> Self {
    self.row_labels = labels;
    self
  }

  /// Attaches column labels (one per column).
  pub fn with_col_labels(mut self, labels: Vec<String>) -> Self {
    self.col_labels = labels;
    self
  }

  /// Returns the row count.
  pub fn rows(&self) -> usize {
    self.rows
  }

  /// Returns the column count.
  pub fn cols(&self) -> usize {
    self.cols
  }

  /// Returns the cell at `(row, col)`, or `NaN` out of bounds.
  pub fn get(&self, row: usize, col: usize) -> f64 {
    if row < self.rows && col < self.cols {
      self.data[row * self.cols + col]
    } else {
      f64::NAN
    }
  }

  /// Returns the row labels (possibly empty).
  pub fn row_labels(&self) -> &[String] {
    &self.row_labels
  }

  /// Returns the column labels (possibly empty).
  pub fn col_labels(&self) -> &[String] {
    &self.col_labels
  }

  /// Returns the raw row-major data.
  pub fn data(&self) -> &[f64] {
    &self.data
  }

  /// Returns the transposed matrix (labels swapped accordingly).
  pub fn transposed(&self) -> Matrix {
    let mut data = vec![0.0; self.data.len()];
    for r in 0..self.rows {
      for c in 0..self.cols {
        data[c * self.rows + r] = self.data[r * self.cols + c];
      }
    }
    Matrix {
      rows: self.cols,
      cols: self.rows,
      data,
      row_labels: self.col_labels.clone(),
      col_labels: self.row_labels.clone(),
    }
  }
}

/// A value passed to or returned from the statistics engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
  /// Dense numeric matrix.
  Matrix(Matrix),
  /// Vector of strings (labels, sample names).
  Strings(Vec<String>),
}

impl ArrayValue {
  /// Returns the matrix payload, if any.
  pub fn as_matrix(&self) -> Option<&Matrix> {
    match self {
      ArrayValue::Matrix(matrix) => Some(matrix),
      ArrayValue::Strings(_) => None,
    }
  }
}

/// The external statistics runtime.
///
/// Implementations evaluate `script` with `inputs` bound under their given
/// names and return the arrays named in `requested_outputs`.
#[async_trait]
pub trait StatsEngine: Send + Sync {
  /// Executes one script against the engine.
  async fn execute(
    &self,
    script: &str,
    inputs: HashMap<String, ArrayValue>,
    requested_outputs: &[&str],
  ) -> Result<HashMap<String, ArrayValue>, EngineError>;
}

/// Pulls a named matrix out of an engine response.
///
/// Missing or non-matrix entries become [`EngineError::MissingArray`].
pub fn require_array(
  results: &HashMap<String, ArrayValue>,
  name: &str,
) -> Result<Matrix, EngineError> {
  results
    .get(name)
    .and_then(|value| value.as_matrix())
    .cloned()
    .ok_or_else(|| EngineError::MissingArray(name.to_string()))
}

/// Converts a table into a dense matrix, one matrix column per table column.
///
/// When `skip_first_column` is set the leading column is treated as the row
/// header: its text values become row labels instead of data. Any remaining
/// non-numeric column fails the conversion at the point the engine
/// primitive is invoked, not before.
pub fn table_to_array(table: &Table, skip_first_column: bool) -> Result<Matrix, EngineError> {
  let start = usize::from(skip_first_column);
  let rows = table.row_count();
  let cols = table.column_count().saturating_sub(start);

  let mut data = vec![0.0; rows * cols];
  let mut col_labels = Vec::with_capacity(cols);
  for (ci, column) in table.columns().skip(start).enumerate() {
    let values = column
      .as_numeric()
      .ok_or_else(|| EngineError::NonNumericColumn(column.name().to_string()))?;
    col_labels.push(column.name().to_string());
    for (ri, value) in values.iter().enumerate() {
      data[ri * cols + ci] = *value;
    }
  }

  let mut matrix = Matrix::new(rows, cols, data)
    .unwrap_or_default()
    .with_col_labels(col_labels);
  if skip_first_column {
    if let Some(header) = table.column(0).and_then(Column::as_text) {
      matrix = matrix.with_row_labels(header.to_vec());
    }
  }
  Ok(matrix)
}

/// Converts a matrix back into a table.
///
/// Row labels, when present, become a leading text column named `header`;
/// data columns are named from the column labels (or `column_<i>`).
pub fn array_to_table(matrix: &Matrix) -> Table {
  let mut table = Table::new();
  if !matrix.row_labels().is_empty() {
    table.push_column(Column::text("header", matrix.row_labels().to_vec()));
  }
  for c in 0..matrix.cols() {
    let name = matrix
      .col_labels()
      .get(c)
      .cloned()
      .unwrap_or_else(|| format!("column_{c}"));
    let values = (0..matrix.rows()).map(|r| matrix.get(r, c)).collect();
    table.push_column(Column::numeric(name, values));
  }
  table
}
