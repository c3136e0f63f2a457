//! # Cross Correlation
//!
//! Computes the pairwise correlation matrix of the analytes in a table
//! and derives two extra representations from it: a sparsified
//! correlation graph keeping only the strong pairs, and a dense heat map
//! matrix.
//!
//! Sparsification keeps an edge for every unordered analyte pair whose
//! correlation magnitude exceeds the threshold (`|r| > threshold`, so
//! strong negative correlations survive too). Self-correlations never
//! become edges, and each pair appears at most once.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::analysis::{Analysis, AnalysisState, ExecutionContext, OutputSpec};
use crate::analyses::bound_table;
use crate::data_object::{DataObject, DataValue};
use crate::engine::{array_to_table, require_array, table_to_array, ArrayValue, Matrix};
use crate::error::AnalysisError;
use crate::graph::Graph;
use crate::parameter::Parameter;

/// Default sparsification threshold on the correlation magnitude.
pub const DEFAULT_CORRELATION_THRESHOLD: f64 = 0.1;

/// Pairwise analyte correlation over one table input.
pub struct CrossCorrelation {
  state: AnalysisState,
  threshold: f64,
}

impl Default for CrossCorrelation {
  fn default() -> Self {
    Self::new()
  }
}

impl CrossCorrelation {
  /// Creates an instance with the default threshold.
  pub fn new() -> Self {
    Self {
      state: AnalysisState::new(),
      threshold: DEFAULT_CORRELATION_THRESHOLD,
    }
  }

  /// Overrides the sparsification threshold.
  pub fn with_threshold(mut self, threshold: f64) -> Self {
    self.threshold = threshold;
    self
  }

  /// Builds the sparsified correlation graph from a correlation matrix.
  fn sparsify(&self, correlation: &Matrix) -> Graph {
    let labels = correlation.row_labels();
    let mut graph = Graph::new();
    for label in labels {
      graph.add_vertex(label.clone());
    }
    for r in 0..correlation.rows() {
      for c in (r + 1)..correlation.cols() {
        let value = correlation.get(r, c);
        if value.abs() > self.threshold {
          let source = labels.get(r).cloned().unwrap_or_else(|| r.to_string());
          let target = labels.get(c).cloned().unwrap_or_else(|| c.to_string());
          graph.add_edge(source, target, value);
        }
      }
    }
    graph
  }
}

#[async_trait]
impl Analysis for CrossCorrelation {
  fn state(&self) -> &AnalysisState {
    &self.state
  }

  fn state_mut(&mut self) -> &mut AnalysisState {
    &mut self.state
  }

  fn type_name(&self) -> &'static str {
    "cross-correlation"
  }

  fn declare_inputs(&mut self) {
    self.state.add_input_type("input", "table");
  }

  fn declare_outputs(&mut self) {
    self.state.add_output(
      OutputSpec::new("corr", "table").with_raw_view("table-view", "Table (Correlation)"),
    );
    self.state.add_output(
      OutputSpec::new("correlation_graph", "graph")
        .with_view("correlation-graph-view", "Correlation Graph"),
    );
    self.state.add_output(
      OutputSpec::new("correlation_heatmap", "matrix")
        .with_view("correlation-heat-map-view", "Correlation Heat Map"),
    );
  }

  fn declare_parameters(&mut self) {
    self.state.add_parameter_group(
      "Correlation parameters",
      vec![Parameter::enumeration(
        "method",
        "Method",
        &["pearson", "kendall", "spearman"],
        "pearson",
      )],
    );
  }

  async fn execute(&mut self, ctx: &ExecutionContext) -> Result<(), AnalysisError> {
    let method = self
      .state
      .parameters()
      .enum_parameter("method")
      .ok_or_else(|| AnalysisError::InvalidParameter("method".to_string()))?
      .to_string();

    let table = bound_table(&self.state, "input")?;
    let matrix = table_to_array(table, true)?;
    let analyte_names = matrix.row_labels().to_vec();

    let script = format!("correl <- cor(t(metabData), method = \"{method}\")\n");
    let mut inputs = HashMap::new();
    inputs.insert("metabData".to_string(), ArrayValue::Matrix(matrix));
    let results = ctx.engine.execute(&script, inputs, &["correl"]).await?;

    let correlation = require_array(&results, "correl")?
      .with_row_labels(analyte_names.clone())
      .with_col_labels(analyte_names);

    let graph = self.sparsify(&correlation);
    self.state.set_output(
      "corr",
      DataObject::table("corr", array_to_table(&correlation)),
    );
    self.state.set_output(
      "correlation_graph",
      DataObject::graph("correlation_graph", graph),
    );
    self.state.set_output(
      "correlation_heatmap",
      DataObject::new("correlation_heatmap", DataValue::Matrix(correlation)),
    );
    Ok(())
  }
}
