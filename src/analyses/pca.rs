//! # Principal Component Analysis
//!
//! Projects the samples of an omics table onto their principal
//! components and reports the rotation, the standard deviations, and
//! per-component percent loadings. The heavy lifting runs in the
//! statistics engine; this module shapes the inputs and outputs.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::analysis::{Analysis, AnalysisState, ExecutionContext, OutputSpec};
use crate::analyses::bound_table;
use crate::data_object::DataObject;
use crate::engine::{array_to_table, require_array, table_to_array, ArrayValue, Matrix};
use crate::error::AnalysisError;

const SCRIPT: &str = r#"
pc <- prcomp(t(metabData), scale. = FALSE, center = FALSE)
projection <- t(pc$x)
pcaRot <- pc$rotation
pcaSdev <- as.matrix(pc$sdev)
stddev <- pc$sdev ^ 2
perload <- as.matrix(100 * stddev / sum(stddev))
sumperload <- as.matrix(cumsum(perload))
"#;

/// Derives per-component percent loadings from the standard deviations.
///
/// Mirrors the tail of the analysis script: the variance share of each
/// component, scaled to percent, plus its running sum.
fn percent_loadings(sdev: &Matrix) -> Result<(Matrix, Matrix), AnalysisError> {
  let variances: Vec<f64> = sdev.data().iter().map(|s| s * s).collect();
  let total: f64 = variances.iter().sum();
  let loading: Vec<f64> = variances.iter().map(|v| 100.0 * v / total).collect();
  let mut running = 0.0;
  let sumloading: Vec<f64> = loading
    .iter()
    .map(|share| {
      running += share;
      running
    })
    .collect();
  let rows = loading.len();
  match (
    Matrix::new(rows, 1, loading),
    Matrix::new(rows, 1, sumloading),
  ) {
    (Some(loading), Some(sumloading)) => Ok((
      loading.with_row_labels(sdev.row_labels().to_vec()),
      sumloading.with_row_labels(sdev.row_labels().to_vec()),
    )),
    _ => unreachable!(),
  }
}

/// Principal component analysis over one table input.
#[derive(Default)]
pub struct Pca {
  state: AnalysisState,
}

impl Pca {
  /// Creates an instance with fresh state.
  pub fn new() -> Self {
    Self {
      state: AnalysisState::new(),
    }
  }
}

#[async_trait]
impl Analysis for Pca {
  fn state(&self) -> &AnalysisState {
    &self.state
  }

  fn state_mut(&mut self) -> &mut AnalysisState {
    &mut self.state
  }

  fn type_name(&self) -> &'static str {
    "pca"
  }

  fn declare_inputs(&mut self) {
    self.state.add_input_type("input", "table");
  }

  fn declare_outputs(&mut self) {
    self.state.add_output(
      OutputSpec::new("x", "table")
        .with_raw_view("table-view", "Projection (Table)")
        .with_view("pca-projection-plot", "Projection (Plot)"),
    );
    self.state.add_output(
      OutputSpec::new("rot", "table").with_raw_view("table-view", "Table (Rotation)"),
    );
    self.state.add_output(
      OutputSpec::new("sdev", "table").with_raw_view("table-view", "Table (Std Deviation)"),
    );
    self.state.add_output(
      OutputSpec::new("loading", "table")
        .with_raw_view("table-view", "Percent Loading (Table)")
        .with_view("pca-bar-plot", "Percent Loading (Plot)"),
    );
    self.state.add_output(
      OutputSpec::new("sumloading", "table")
        .with_raw_view("table-view", "Cumulative Percent Loading (Table)")
        .with_view("pca-bar-plot", "Cumulative Percent Loading (Plot)"),
    );
    self.state.add_output(
      OutputSpec::new("x-dynview", "table")
        .with_view("pca-projection-dyn-view", "Projection (Interactive Plot)"),
    );
  }

  async fn execute(&mut self, ctx: &ExecutionContext) -> Result<(), AnalysisError> {
    let table = bound_table(&self.state, "input")?;
    let matrix = table_to_array(table, true)?;

    let mut inputs = HashMap::new();
    inputs.insert("metabData".to_string(), ArrayValue::Matrix(matrix));
    let results = ctx
      .engine
      .execute(
        SCRIPT,
        inputs,
        &[
          "projection",
          "pcaRot",
          "pcaSdev",
          "perload",
          "sumperload",
          "stddev",
        ],
      )
      .await?;

    let projection = require_array(&results, "projection")?;
    let rotation = require_array(&results, "pcaRot")?;
    let sdev = require_array(&results, "pcaSdev")?;
    // engines that stop after the prcomp call leave the loadings to us
    let (loading, sumloading) = match (
      require_array(&results, "perload"),
      require_array(&results, "sumperload"),
    ) {
      (Ok(loading), Ok(sumloading)) => (loading, sumloading),
      _ => percent_loadings(&sdev)?,
    };

    self
      .state
      .set_output("x", DataObject::table("x", array_to_table(&projection)));
    self
      .state
      .set_output("rot", DataObject::table("rot", array_to_table(&rotation)));
    self
      .state
      .set_output("sdev", DataObject::table("sdev", array_to_table(&sdev)));
    self.state.set_output(
      "loading",
      DataObject::table("loading", array_to_table(&loading)),
    );
    self.state.set_output(
      "sumloading",
      DataObject::table("sumloading", array_to_table(&sumloading)),
    );
    // the interactive projection view gets its own copy of the projection
    self.state.set_output(
      "x-dynview",
      DataObject::table("x-dynview", array_to_table(&projection)),
    );
    Ok(())
  }
}
