//! # KMeans Clustering
//!
//! Partitions the samples of a table into `centers` clusters via the
//! statistics engine's `kmeans`, then renumbers the returned cluster ids
//! into a canonical order so re-runs with the same partition always
//! label it the same way.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::analysis::{Analysis, AnalysisState, ExecutionContext, OutputSpec};
use crate::analyses::bound_table;
use crate::data_object::DataObject;
use crate::engine::{require_array, table_to_array, ArrayValue};
use crate::error::AnalysisError;
use crate::parameter::Parameter;
use crate::table::{Column, Table};

/// KMeans clustering over one table input.
#[derive(Default)]
pub struct KmeansClustering {
  state: AnalysisState,
}

impl KmeansClustering {
  /// Creates an instance with fresh state.
  pub fn new() -> Self {
    Self {
      state: AnalysisState::new(),
    }
  }
}

#[async_trait]
impl Analysis for KmeansClustering {
  fn state(&self) -> &AnalysisState {
    &self.state
  }

  fn state_mut(&mut self) -> &mut AnalysisState {
    &mut self.state
  }

  fn type_name(&self) -> &'static str {
    "kmeans-clustering"
  }

  fn declare_inputs(&mut self) {
    self.state.add_input_type("input", "table");
  }

  fn declare_outputs(&mut self) {
    self.state.add_output(
      OutputSpec::new("cluster", "table").with_raw_view("table-view", "cluster"),
    );
  }

  fn declare_parameters(&mut self) {
    self.state.add_parameter_group(
      "KMeans parameters",
      vec![
        Parameter::integer("centers", "Number of clusters", 2, 10, 4),
        Parameter::integer("iter.max", "Max. iterations", 5, 50, 10),
        Parameter::enumeration(
          "algorithm",
          "Algorithm",
          &["Hartigan-Wong", "Lloyd", "Forgy", "MacQueen"],
          "Hartigan-Wong",
        ),
      ],
    );
  }

  async fn execute(&mut self, ctx: &ExecutionContext) -> Result<(), AnalysisError> {
    let centers = self
      .state
      .parameters()
      .integer_parameter("centers")
      .ok_or_else(|| AnalysisError::InvalidParameter("centers".to_string()))?;
    let iter_max = self
      .state
      .parameters()
      .integer_parameter("iter.max")
      .ok_or_else(|| AnalysisError::InvalidParameter("iter.max".to_string()))?;
    let algorithm = self
      .state
      .parameters()
      .enum_parameter("algorithm")
      .ok_or_else(|| AnalysisError::InvalidParameter("algorithm".to_string()))?
      .to_string();

    let table = bound_table(&self.state, "input")?;
    let matrix = table_to_array(table, true)?;
    let sample_names = matrix.col_labels().to_vec();

    let script = format!(
      "km <- kmeans(t(metabData), {centers}, iter.max = {iter_max}, algorithm = \"{algorithm}\")\n\
       kmCenters <- km$centers\n\
       kmCluster <- as.matrix(km$cluster)\n\
       kmWithinss <- as.matrix(km$withinss)\n\
       kmSize <- as.matrix(km$size)\n"
    );
    let mut inputs = HashMap::new();
    inputs.insert("metabData".to_string(), ArrayValue::Matrix(matrix));
    let results = ctx
      .engine
      .execute(
        &script,
        inputs,
        &["kmCenters", "kmCluster", "kmWithinss", "kmSize"],
      )
      .await?;

    let cluster = require_array(&results, "kmCluster")?;
    let mut ids: Vec<i64> = cluster.data().iter().map(|v| *v as i64).collect();
    renumber_clusters(&mut ids);

    let mut output = Table::new();
    output.push_column(Column::text("header", vec!["Cluster number".to_string()]));
    for (index, id) in ids.iter().enumerate() {
      let name = sample_names
        .get(index)
        .cloned()
        .unwrap_or_else(|| format!("column_{index}"));
      output.push_column(Column::numeric(name, vec![*id as f64]));
    }

    self.state.set_output(
      "cluster",
      DataObject::table("cluster", output)
        .with_property("kmeans_centers", serde_json::json!(centers)),
    );
    Ok(())
  }
}

/// Renumbers cluster ids into first-appearance order, in place.
///
/// Scanning left to right, the first id encountered becomes `1`, the
/// next distinct id becomes `2`, and so on; every occurrence of an id is
/// relabeled across the whole slice. `[3, 3, 1, 2, 1]` becomes
/// `[1, 1, 2, 3, 2]`.
pub fn renumber_clusters(ids: &mut [i64]) {
  let mut next = 0i64;
  let mut index = 0;
  while index < ids.len() {
    let id = ids[index];
    // negatives mark ids already assigned their final label
    if id > 0 {
      next += 1;
      for value in ids.iter_mut() {
        if *value == id {
          *value = -next;
        }
      }
    }
    index += 1;
  }
  for value in ids.iter_mut() {
    *value = -*value;
  }
}
