//! # Hierarchical Clustering
//!
//! Agglomerative clustering of the samples into a dendrogram. The
//! engine runs `hclust` over the euclidean sample distances; this
//! module folds the resulting merge encoding into a nested
//! [`TreeStructure`] with one leaf per sample.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::analysis::{Analysis, AnalysisState, ExecutionContext, OutputSpec};
use crate::analyses::bound_table;
use crate::data_object::{DataObject, DataValue, TreeStructure};
use crate::engine::{require_array, table_to_array, ArrayValue, Matrix};
use crate::error::{AnalysisError, EngineError};
use crate::parameter::Parameter;

/// Agglomerative sample clustering over one table input.
#[derive(Default)]
pub struct HierarchicalClustering {
  state: AnalysisState,
}

impl HierarchicalClustering {
  /// Creates an instance with fresh state.
  pub fn new() -> Self {
    Self {
      state: AnalysisState::new(),
    }
  }
}

/// Folds an `hclust` merge encoding into a nested dendrogram.
///
/// `merge` carries two entries per agglomeration step in column-major
/// order: all first entries, then all second entries. A negative entry
/// is a singleton sample (1-based), a positive entry refers to the
/// cluster formed at that earlier step (1-based). Internal nodes are
/// unlabeled; leaves carry the sample name.
pub fn build_dendrogram(
  samples: &[String],
  merge: &Matrix,
  steps: usize,
) -> Result<TreeStructure, AnalysisError> {
  fn resolve(
    entry: f64,
    samples: &[String],
    clusters: &mut [Option<TreeStructure>],
  ) -> Option<TreeStructure> {
    let index = entry as i64;
    if index < 0 {
      let sample = samples.get(index.unsigned_abs() as usize - 1)?;
      Some(TreeStructure {
        name: sample.clone(),
        children: Vec::new(),
      })
    } else if index > 0 {
      clusters.get_mut(index as usize - 1)?.take()
    } else {
      None
    }
  }

  let shape_error = || EngineError::UnexpectedShape {
    name: "merge".to_string(),
    rows: merge.rows(),
    cols: merge.cols(),
  };
  let entries = merge.data();
  if steps == 0 || entries.len() != 2 * steps || samples.len() != steps + 1 {
    return Err(shape_error().into());
  }

  let mut clusters: Vec<Option<TreeStructure>> = Vec::with_capacity(steps);
  for step in 0..steps {
    let first = resolve(entries[step], samples, &mut clusters).ok_or_else(shape_error)?;
    let second = resolve(entries[step + steps], samples, &mut clusters).ok_or_else(shape_error)?;
    clusters.push(Some(TreeStructure {
      name: String::new(),
      children: vec![first, second],
    }));
  }
  // the final step merges everything into the root
  clusters
    .pop()
    .flatten()
    .ok_or_else(|| shape_error().into())
}

#[async_trait]
impl Analysis for HierarchicalClustering {
  fn state(&self) -> &AnalysisState {
    &self.state
  }

  fn state_mut(&mut self) -> &mut AnalysisState {
    &mut self.state
  }

  fn type_name(&self) -> &'static str {
    "hierarchical-clustering"
  }

  fn declare_inputs(&mut self) {
    self.state.add_input_type("input", "table");
  }

  fn declare_outputs(&mut self) {
    self.state.add_output(
      OutputSpec::new("clusterTree", "tree").with_raw_view("tree-graph-view", "clusterTree"),
    );
  }

  fn declare_parameters(&mut self) {
    self.state.add_parameter_group(
      "HClust parameters",
      vec![Parameter::enumeration(
        "method",
        "Method",
        &["complete", "average", "mcquitty", "median", "centroid"],
        "average",
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
    let samples = matrix.col_labels().to_vec();

    let script = format!(
      "dEuc <- dist(t(metabData))\n\
       cluster <- hclust(dEuc, method = \"{method}\")\n\
       height <- as.numeric(cluster$height)\n\
       order <- as.numeric(cluster$order)\n\
       merge <- as.numeric(cluster$merge)\n"
    );
    let mut inputs = HashMap::new();
    inputs.insert("metabData".to_string(), ArrayValue::Matrix(matrix));
    let results = ctx
      .engine
      .execute(&script, inputs, &["height", "order", "merge"])
      .await?;

    let height = require_array(&results, "height")?;
    let merge = require_array(&results, "merge")?;
    let steps = height.data().len();
    let dendrogram = build_dendrogram(&samples, &merge, steps)?;

    self.state.set_output(
      "clusterTree",
      DataObject::new("clusterTree", DataValue::Tree(dendrogram))
        .with_property("heights", serde_json::json!(height.data())),
    );
    Ok(())
  }
}
