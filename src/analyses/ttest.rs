//! # T-Test
//!
//! Runs Welch's two-sample t-test per analyte across two sample groups
//! selected by spreadsheet-style column ranges, producing a table of
//! p-values.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::analysis::{Analysis, AnalysisState, ExecutionContext, OutputSpec};
use crate::analyses::bound_table;
use crate::data_object::DataObject;
use crate::engine::{require_array, table_to_array, ArrayValue, Matrix};
use crate::error::AnalysisError;
use crate::parameter::Parameter;
use crate::table::{parse_column_range, Column, Table};

const SCRIPT: &str = r#"
pvalues <- apply(metabData, 1, function(row) {
  t.test(row[selectorA == 1], row[selectorB == 1])$p.value
})
TTest <- as.matrix(pvalues)
"#;

/// Welch's t-test between two sample groups of one table input.
#[derive(Default)]
pub struct TTest {
  state: AnalysisState,
}

impl TTest {
  /// Creates an instance with fresh state.
  pub fn new() -> Self {
    Self {
      state: AnalysisState::new(),
    }
  }
}

/// 0/1 membership row for one sample group.
fn selector(indices: &[usize], data_columns: usize) -> Matrix {
  let mut row = vec![0.0; data_columns];
  for i in indices {
    if let Some(cell) = row.get_mut(*i) {
      *cell = 1.0;
    }
  }
  Matrix::new(1, data_columns, row).unwrap_or_default()
}

#[async_trait]
impl Analysis for TTest {
  fn state(&self) -> &AnalysisState {
    &self.state
  }

  fn state_mut(&mut self) -> &mut AnalysisState {
    &mut self.state
  }

  fn type_name(&self) -> &'static str {
    "ttest"
  }

  fn declare_inputs(&mut self) {
    self.state.add_input_type("input", "table");
  }

  fn declare_outputs(&mut self) {
    self.state.add_output(
      OutputSpec::new("tstats", "table").with_raw_view("table-view", "Table"),
    );
  }

  fn declare_parameters(&mut self) {
    self.state.add_parameter_group(
      "T-Test parameters",
      vec![
        Parameter::string("sample1_range", "Sample group 1 columns", "A-C,F"),
        Parameter::string("sample2_range", "Sample group 2 columns", "D,E,G-J"),
      ],
    );
  }

  async fn execute(&mut self, ctx: &ExecutionContext) -> Result<(), AnalysisError> {
    let table = bound_table(&self.state, "input")?;
    let matrix = table_to_array(table, true)?;
    let analyte_names = matrix.row_labels().to_vec();
    let data_columns = matrix.cols();

    let resolve = |id: &str| -> Result<Vec<usize>, AnalysisError> {
      let range = self
        .state
        .parameters()
        .string_parameter(id)
        .ok_or_else(|| AnalysisError::InvalidParameter(id.to_string()))?;
      let indices =
        parse_column_range(range).ok_or_else(|| AnalysisError::InvalidParameter(id.to_string()))?;
      if indices.iter().any(|i| *i >= data_columns) {
        return Err(AnalysisError::InvalidParameter(id.to_string()));
      }
      Ok(indices)
    };
    let group1 = resolve("sample1_range")?;
    let group2 = resolve("sample2_range")?;

    let mut inputs = HashMap::new();
    inputs.insert("metabData".to_string(), ArrayValue::Matrix(matrix));
    inputs.insert(
      "selectorA".to_string(),
      ArrayValue::Matrix(selector(&group1, data_columns)),
    );
    inputs.insert(
      "selectorB".to_string(),
      ArrayValue::Matrix(selector(&group2, data_columns)),
    );
    let results = ctx.engine.execute(SCRIPT, inputs, &["TTest"]).await?;
    let pvalues = require_array(&results, "TTest")?;

    let mut output = Table::new();
    output.push_column(Column::text("header", analyte_names));
    output.push_column(Column::numeric(
      "p-value",
      (0..pvalues.rows()).map(|r| pvalues.get(r, 0)).collect(),
    ));
    self
      .state
      .set_output("tstats", DataObject::table("tstats", output));
    Ok(())
  }
}
