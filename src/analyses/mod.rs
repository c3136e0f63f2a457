//! # Built-in Analyses
//!
//! The analyses shipped with the workbench. Each one is a plain struct
//! embedding an [`AnalysisState`](crate::analysis::AnalysisState) and
//! implementing the declaration and `execute` hooks; everything else
//! (validation, binding, events, materialization) is inherited from the
//! trait defaults and the driver.

mod fold_change;
mod hclust;
mod kegg_pathways;
mod kmeans;
mod pca;
mod ttest;
mod xcorrel;

pub use fold_change::FoldChange;
pub use hclust::{build_dendrogram, HierarchicalClustering};
pub use kegg_pathways::KeggPathways;
pub use kmeans::{renumber_clusters, KmeansClustering};
pub use pca::Pca;
pub use ttest::TTest;
pub use xcorrel::CrossCorrelation;

use crate::analysis::AnalysisState;
use crate::error::AnalysisError;
use crate::table::Table;

/// Pulls the table payload of a bound input, failing with
/// [`AnalysisError::InvalidInputPayload`] when the payload is anything
/// else.
pub(crate) fn bound_table<'a>(
  state: &'a AnalysisState,
  name: &str,
) -> Result<&'a Table, AnalysisError> {
  let data = state
    .input(name)
    .ok_or_else(|| AnalysisError::MissingInput(name.to_string()))?;
  data
    .as_table()
    .ok_or_else(|| AnalysisError::InvalidInputPayload {
      name: name.to_string(),
      expected: "table".to_string(),
      actual: data.value().type_name().to_string(),
    })
}
