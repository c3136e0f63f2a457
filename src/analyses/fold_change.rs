//! # Fold Change
//!
//! Compares two sample groups, selected by spreadsheet-style column
//! ranges, and reports the per-analyte ratio of group means together
//! with its base-2 logarithm. The mean can be arithmetic or geometric.

use async_trait::async_trait;

use crate::analysis::{Analysis, AnalysisState, ExecutionContext, OutputSpec};
use crate::analyses::bound_table;
use crate::data_object::DataObject;
use crate::error::AnalysisError;
use crate::parameter::Parameter;
use crate::table::{parse_column_range, Column, Table};

/// Fold change between two sample groups of one table input.
#[derive(Default)]
pub struct FoldChange {
  state: AnalysisState,
}

impl FoldChange {
  /// Creates an instance with fresh state.
  pub fn new() -> Self {
    Self {
      state: AnalysisState::new(),
    }
  }
}

fn group_mean(values: &[f64], geometric: bool) -> f64 {
  if values.is_empty() {
    return f64::NAN;
  }
  if geometric {
    let log_sum: f64 = values.iter().map(|v| v.ln()).sum();
    (log_sum / values.len() as f64).exp()
  } else {
    values.iter().sum::<f64>() / values.len() as f64
  }
}

/// Resolves a range parameter into data-column indices, checking they
/// stay inside the table.
fn resolve_range(
  state: &AnalysisState,
  id: &str,
  data_columns: usize,
) -> Result<Vec<usize>, AnalysisError> {
  let range = state
    .parameters()
    .string_parameter(id)
    .ok_or_else(|| AnalysisError::InvalidParameter(id.to_string()))?;
  let indices =
    parse_column_range(range).ok_or_else(|| AnalysisError::InvalidParameter(id.to_string()))?;
  if indices.iter().any(|i| *i >= data_columns) {
    return Err(AnalysisError::InvalidParameter(id.to_string()));
  }
  Ok(indices)
}

#[async_trait]
impl Analysis for FoldChange {
  fn state(&self) -> &AnalysisState {
    &self.state
  }

  fn state_mut(&mut self) -> &mut AnalysisState {
    &mut self.state
  }

  fn type_name(&self) -> &'static str {
    "fold-change"
  }

  fn declare_inputs(&mut self) {
    self.state.add_input_type("input", "table");
  }

  fn declare_outputs(&mut self) {
    self.state.add_output(
      OutputSpec::new("foldChange", "table").with_raw_view("table-view", "Table"),
    );
    self.state.add_output(
      OutputSpec::new("foldChangePlot", "table")
        .with_view("horizontal-bar-view", "Horizontal Plot"),
    );
  }

  fn declare_parameters(&mut self) {
    self.state.add_parameter_group(
      "Fold change parameters",
      vec![
        Parameter::enumeration(
          "mean_method",
          "Mean method",
          &["Geometric", "Arithmetic"],
          "Arithmetic",
        ),
        Parameter::string("sample1_range", "Sample group 1 columns", "A-C,F"),
        Parameter::string("sample2_range", "Sample group 2 columns", "D,E,G-J"),
      ],
    );
  }

  async fn execute(&mut self, _ctx: &ExecutionContext) -> Result<(), AnalysisError> {
    let geometric = self
      .state
      .parameters()
      .enum_parameter("mean_method")
      .ok_or_else(|| AnalysisError::InvalidParameter("mean_method".to_string()))?
      == "Geometric";

    let table = bound_table(&self.state, "input")?;
    // first column holds the analyte names, data columns follow
    let data_columns = table.column_count().saturating_sub(1);
    let group1 = resolve_range(&self.state, "sample1_range", data_columns)?;
    let group2 = resolve_range(&self.state, "sample2_range", data_columns)?;

    let analytes = table
      .column(0)
      .and_then(Column::as_text)
      .map(<[String]>::to_vec)
      .unwrap_or_default();
    let rows = table.row_count();

    let mut ratios = Vec::with_capacity(rows);
    let mut log_ratios = Vec::with_capacity(rows);
    for row in 0..rows {
      let collect = |group: &[usize]| -> Vec<f64> {
        group
          .iter()
          .filter_map(|i| table.column(i + 1).and_then(Column::as_numeric))
          .map(|values| values[row])
          .collect()
      };
      let mean1 = group_mean(&collect(&group1), geometric);
      let mean2 = group_mean(&collect(&group2), geometric);
      let ratio = mean2 / mean1;
      ratios.push(ratio);
      log_ratios.push(ratio.log2());
    }

    let mut output = Table::new();
    output.push_column(Column::text("header", analytes));
    output.push_column(Column::numeric("Fold change (ratio)", ratios));
    output.push_column(Column::numeric("Fold change (log2)", log_ratios));

    let plot = output.clone();
    self
      .state
      .set_output("foldChange", DataObject::table("foldChange", output));
    self
      .state
      .set_output("foldChangePlot", DataObject::table("foldChangePlot", plot));
    Ok(())
  }
}
