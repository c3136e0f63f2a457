//! Tests for the built-in analyses: cluster renumbering, correlation
//! sparsification, fold change arithmetic, and pathway lookup faults.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::analysis::{Analysis, ExecutionContext};
use crate::analyses::{
  build_dendrogram, renumber_clusters, CrossCorrelation, FoldChange, HierarchicalClustering,
  KeggPathways, Pca,
};
use crate::data_object::DataObject;
use crate::engine::{ArrayValue, Matrix, StatsEngine};
use crate::error::{AnalysisError, EngineError, KeggError};
use crate::kegg::{KeggClient, KeggPathway};
use crate::table::{Column, Table};

/// Answers every script with a canned set of arrays.
struct CannedEngine {
  results: HashMap<String, ArrayValue>,
}

#[async_trait]
impl StatsEngine for CannedEngine {
  async fn execute(
    &self,
    _script: &str,
    _inputs: HashMap<String, ArrayValue>,
    _requested_outputs: &[&str],
  ) -> Result<HashMap<String, ArrayValue>, EngineError> {
    Ok(self.results.clone())
  }
}

struct NullKegg;

#[async_trait]
impl KeggClient for NullKegg {
  async fn pathways_for(&self, _host: &str, _term: &str) -> Result<Vec<KeggPathway>, KeggError> {
    Ok(Vec::new())
  }
}

fn context_with(results: HashMap<String, ArrayValue>) -> ExecutionContext {
  ExecutionContext {
    engine: Arc::new(CannedEngine { results }),
    kegg: Arc::new(NullKegg),
  }
}

fn analyte_table() -> Table {
  let mut table = Table::new();
  table.push_column(Column::text(
    "analyte",
    vec!["A".to_string(), "B".to_string(), "C".to_string()],
  ));
  table.push_column(Column::numeric("S1", vec![1.0, 2.0, 3.0]));
  table.push_column(Column::numeric("S2", vec![4.0, 5.0, 6.0]));
  table
}

// --- cluster renumbering ----------------------------------------------------

#[test]
fn test_renumber_clusters_uses_first_appearance_order() {
  let mut ids = vec![3, 3, 1, 2, 1];
  renumber_clusters(&mut ids);
  assert_eq!(ids, vec![1, 1, 2, 3, 2]);
}

#[test]
fn test_renumber_clusters_identity_when_already_canonical() {
  let mut ids = vec![1, 2, 2, 3];
  renumber_clusters(&mut ids);
  assert_eq!(ids, vec![1, 2, 2, 3]);
}

#[test]
fn test_renumber_clusters_single_cluster() {
  let mut ids = vec![7, 7, 7];
  renumber_clusters(&mut ids);
  assert_eq!(ids, vec![1, 1, 1]);
}

#[test]
fn test_renumber_clusters_empty_slice() {
  let mut ids: Vec<i64> = Vec::new();
  renumber_clusters(&mut ids);
  assert!(ids.is_empty());
}

#[test]
fn test_renumber_clusters_handles_label_overlap() {
  // targets collide with original ids mid-scan
  let mut ids = vec![2, 1, 2, 1];
  renumber_clusters(&mut ids);
  assert_eq!(ids, vec![1, 2, 1, 2]);
}

// --- correlation sparsification ---------------------------------------------

#[tokio::test]
async fn test_sparsification_keeps_strong_pairs_only() {
  // |r|: (A,B)=0.05 drops, (A,C)=0.5 stays, (B,C)=0.2 stays (negative)
  let correlation = Matrix::new(
    3,
    3,
    vec![1.0, 0.05, 0.5, 0.05, 1.0, -0.2, 0.5, -0.2, 1.0],
  )
  .unwrap();
  let mut results = HashMap::new();
  results.insert("correl".to_string(), ArrayValue::Matrix(correlation));
  let ctx = context_with(results);

  let mut analysis = CrossCorrelation::new();
  analysis.initialize_input_information();
  analysis.initialize_output_information();
  analysis.initialize_parameter_information(&HashMap::new());
  analysis
    .state_mut()
    .set_input("input", Arc::new(DataObject::table("input", analyte_table())));
  analysis.run(&ctx).await.unwrap();

  let graph_object = analysis.state().output("correlation_graph").unwrap();
  let graph = graph_object.as_graph().unwrap();
  assert_eq!(graph.vertex_count(), 3);
  assert_eq!(graph.edge_count(), 2);
  assert!(graph.has_edge("A", "C"));
  assert!(graph.has_edge("B", "C"));
  assert!(!graph.has_edge("A", "B"));
  // diagonal never becomes a self edge
  assert!(!graph.has_edge("A", "A"));
}

#[tokio::test]
async fn test_sparsification_threshold_is_configurable() {
  let correlation = Matrix::new(
    3,
    3,
    vec![1.0, 0.05, 0.5, 0.05, 1.0, -0.2, 0.5, -0.2, 1.0],
  )
  .unwrap();
  let mut results = HashMap::new();
  results.insert("correl".to_string(), ArrayValue::Matrix(correlation));
  let ctx = context_with(results);

  let mut analysis = CrossCorrelation::new().with_threshold(0.3);
  analysis.initialize_input_information();
  analysis.initialize_output_information();
  analysis.initialize_parameter_information(&HashMap::new());
  analysis
    .state_mut()
    .set_input("input", Arc::new(DataObject::table("input", analyte_table())));
  analysis.run(&ctx).await.unwrap();

  let graph_object = analysis.state().output("correlation_graph").unwrap();
  let graph = graph_object.as_graph().unwrap();
  assert_eq!(graph.edge_count(), 1);
  assert!(graph.has_edge("A", "C"));
}

// --- hierarchical clustering ------------------------------------------------

#[tokio::test]
async fn test_hierarchical_clustering_builds_the_dendrogram() {
  // three samples, two merge steps: (S1, S2) first, then S3 joins them;
  // merge entries are column-major (first entries, then second entries)
  let mut results = HashMap::new();
  results.insert(
    "height".to_string(),
    ArrayValue::Matrix(Matrix::new(2, 1, vec![0.5, 1.2]).unwrap()),
  );
  results.insert(
    "order".to_string(),
    ArrayValue::Matrix(Matrix::new(3, 1, vec![3.0, 1.0, 2.0]).unwrap()),
  );
  results.insert(
    "merge".to_string(),
    ArrayValue::Matrix(Matrix::new(4, 1, vec![-1.0, -3.0, -2.0, 1.0]).unwrap()),
  );
  let ctx = context_with(results);

  let mut table = Table::new();
  table.push_column(Column::text(
    "analyte",
    vec!["A".to_string(), "B".to_string()],
  ));
  table.push_column(Column::numeric("S1", vec![1.0, 2.0]));
  table.push_column(Column::numeric("S2", vec![1.1, 2.1]));
  table.push_column(Column::numeric("S3", vec![9.0, 8.0]));

  let mut analysis = HierarchicalClustering::new();
  analysis.initialize_input_information();
  analysis.initialize_output_information();
  analysis.initialize_parameter_information(&HashMap::new());
  analysis
    .state_mut()
    .set_input("input", Arc::new(DataObject::table("input", table)));
  analysis.run(&ctx).await.unwrap();

  let output = analysis.state().output("clusterTree").unwrap();
  let root = output.as_tree().unwrap();
  assert!(root.name.is_empty());
  assert_eq!(root.children.len(), 2);
  assert_eq!(root.children[0].name, "S3");
  assert!(root.children[0].children.is_empty());
  let pair = &root.children[1];
  assert!(pair.name.is_empty());
  let leaves: Vec<&str> = pair.children.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(leaves, vec!["S1", "S2"]);
  assert_eq!(
    output.property("heights"),
    Some(&serde_json::json!([0.5, 1.2]))
  );
}

#[test]
fn test_dendrogram_rejects_mismatched_merge_shape() {
  let samples = vec!["S1".to_string(), "S2".to_string(), "S3".to_string()];
  // three entries cannot encode two steps of two entries each
  let merge = Matrix::new(3, 1, vec![-1.0, -2.0, 1.0]).unwrap();
  let err = build_dendrogram(&samples, &merge, 2).unwrap_err();
  assert!(matches!(
    err,
    AnalysisError::Engine(EngineError::UnexpectedShape { .. })
  ));
}

// --- pca --------------------------------------------------------------------

#[tokio::test]
async fn test_pca_loadings_fall_back_to_sdev_when_engine_omits_them() {
  // sdev [2, 1] -> variances [4, 1] -> percent [80, 20], cumulative [80, 100]
  let mut results = HashMap::new();
  results.insert(
    "projection".to_string(),
    ArrayValue::Matrix(Matrix::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap()),
  );
  results.insert(
    "pcaRot".to_string(),
    ArrayValue::Matrix(Matrix::new(2, 2, vec![1.0, 0.0, 0.0, 1.0]).unwrap()),
  );
  results.insert(
    "pcaSdev".to_string(),
    ArrayValue::Matrix(Matrix::new(2, 1, vec![2.0, 1.0]).unwrap()),
  );
  let ctx = context_with(results);

  let mut analysis = Pca::new();
  analysis.initialize_input_information();
  analysis.initialize_output_information();
  analysis.initialize_parameter_information(&HashMap::new());
  analysis
    .state_mut()
    .set_input("input", Arc::new(DataObject::table("input", analyte_table())));
  analysis.run(&ctx).await.unwrap();

  let loading = analysis.state().output("loading").unwrap();
  let loading_table = loading.as_table().unwrap();
  assert_eq!(
    loading_table.column_by_name("column_0").unwrap().as_numeric(),
    Some(&[80.0, 20.0][..])
  );
  let sumloading = analysis.state().output("sumloading").unwrap();
  let sumloading_table = sumloading.as_table().unwrap();
  assert_eq!(
    sumloading_table.column_by_name("column_0").unwrap().as_numeric(),
    Some(&[80.0, 100.0][..])
  );
}

// --- fold change ------------------------------------------------------------

#[tokio::test]
async fn test_fold_change_arithmetic_means() {
  let ctx = context_with(HashMap::new());
  let mut analysis = FoldChange::new();
  analysis.initialize_input_information();
  analysis.initialize_output_information();

  let mut overrides = HashMap::new();
  overrides.insert(
    "sample1_range".to_string(),
    crate::parameter::ParameterValue::String("A".to_string()),
  );
  overrides.insert(
    "sample2_range".to_string(),
    crate::parameter::ParameterValue::String("B".to_string()),
  );
  analysis.initialize_parameter_information(&overrides);
  analysis
    .state_mut()
    .set_input("input", Arc::new(DataObject::table("input", analyte_table())));
  analysis.run(&ctx).await.unwrap();

  let output = analysis.state().output("foldChange").unwrap();
  let table = output.as_table().unwrap();
  let ratios = table
    .column_by_name("Fold change (ratio)")
    .unwrap()
    .as_numeric()
    .unwrap();
  // group2 mean over group1 mean, per analyte
  assert_eq!(ratios, &[4.0, 2.5, 2.0]);
}

#[tokio::test]
async fn test_fold_change_invalid_range_fails() {
  let ctx = context_with(HashMap::new());
  let mut analysis = FoldChange::new();
  analysis.initialize_input_information();
  analysis.initialize_output_information();

  let mut overrides = HashMap::new();
  overrides.insert(
    "sample1_range".to_string(),
    crate::parameter::ParameterValue::String("Z".to_string()),
  );
  overrides.insert(
    "sample2_range".to_string(),
    crate::parameter::ParameterValue::String("B".to_string()),
  );
  analysis.initialize_parameter_information(&overrides);
  analysis
    .state_mut()
    .set_input("input", Arc::new(DataObject::table("input", analyte_table())));
  let err = analysis.run(&ctx).await.unwrap_err();
  assert!(matches!(err, AnalysisError::InvalidParameter(id) if id == "sample1_range"));
}

// --- kegg pathway lookup ----------------------------------------------------

struct FlakyKegg;

#[async_trait]
impl KeggClient for FlakyKegg {
  async fn pathways_for(&self, _host: &str, term: &str) -> Result<Vec<KeggPathway>, KeggError> {
    match term {
      "A" => Ok(vec![
        KeggPathway {
          id: "path:hsa00010".to_string(),
          name: "Glycolysis".to_string(),
        },
        KeggPathway {
          id: "path:hsa00020".to_string(),
          name: "Citrate cycle".to_string(),
        },
      ]),
      "B" => Err(KeggError::Malformed("not json".to_string())),
      _ => Ok(Vec::new()),
    }
  }
}

#[tokio::test]
async fn test_pathway_faults_leave_empty_cells() {
  let ctx = ExecutionContext {
    engine: Arc::new(CannedEngine {
      results: HashMap::new(),
    }),
    kegg: Arc::new(FlakyKegg),
  };
  let mut analysis = KeggPathways::new();
  analysis.initialize_input_information();
  analysis.initialize_output_information();
  analysis.initialize_parameter_information(&HashMap::new());
  analysis
    .state_mut()
    .set_input("input", Arc::new(DataObject::table("input", analyte_table())));
  analysis.run(&ctx).await.unwrap();

  let output = analysis.state().output("pathways").unwrap();
  let cells = output
    .as_table()
    .unwrap()
    .column_by_name("KEGG pathways")
    .unwrap()
    .as_text()
    .unwrap();
  assert_eq!(cells[0], "path:hsa00010;path:hsa00020");
  assert_eq!(cells[1], "");
  assert_eq!(cells[2], "");
}
