//! # Analysis Registry
//!
//! Maps stable analysis type names and user-facing pretty names to
//! constructors. Registration is first-wins on either name: a later
//! registration under an already-taken type name or pretty name is a
//! logged no-op, so lookups stay deterministic for the life of the
//! registry.

use std::collections::HashMap;

use crate::analysis::Analysis;
use crate::analyses::{
  CrossCorrelation, FoldChange, HierarchicalClustering, KeggPathways, KmeansClustering, Pca, TTest,
};

type Constructor = Box<dyn Fn() -> Box<dyn Analysis> + Send + Sync>;

struct Registration {
  type_name: String,
  pretty_name: String,
  constructor: Constructor,
}

/// First-wins registry of analysis constructors.
#[derive(Default)]
pub struct AnalysisRegistry {
  registrations: Vec<Registration>,
  by_type_name: HashMap<String, usize>,
  by_pretty_name: HashMap<String, usize>,
}

impl AnalysisRegistry {
  /// Creates an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a registry pre-populated with the built-in analyses.
  pub fn with_builtin_analyses() -> Self {
    let mut registry = Self::new();
    registry.register("pca", "PCA", || Box::new(Pca::new()));
    registry.register("kmeans-clustering", "KMeans Clustering", || {
      Box::new(KmeansClustering::new())
    });
    registry.register("hierarchical-clustering", "Hierarchical Clustering", || {
      Box::new(HierarchicalClustering::new())
    });
    registry.register("cross-correlation", "Cross Correlation", || {
      Box::new(CrossCorrelation::new())
    });
    registry.register("fold-change", "Fold Change", || Box::new(FoldChange::new()));
    registry.register("ttest", "T-Test", || Box::new(TTest::new()));
    registry.register("kegg-pathways", "KEGG Pathways", || {
      Box::new(KeggPathways::new())
    });
    registry
  }

  /// Registers a constructor under a type name and a pretty name.
  ///
  /// Empty names and collisions on either name are logged no-ops.
  pub fn register<F>(&mut self, type_name: &str, pretty_name: &str, constructor: F)
  where
    F: Fn() -> Box<dyn Analysis> + Send + Sync + 'static,
  {
    if type_name.trim().is_empty() || pretty_name.trim().is_empty() {
      tracing::warn!(type_name, pretty_name, "registration needs non-empty names");
      return;
    }
    if self.by_type_name.contains_key(type_name) {
      tracing::warn!(type_name, "analysis type name already registered");
      return;
    }
    if self.by_pretty_name.contains_key(pretty_name) {
      tracing::warn!(pretty_name, "analysis pretty name already registered");
      return;
    }
    let index = self.registrations.len();
    self.registrations.push(Registration {
      type_name: type_name.to_string(),
      pretty_name: pretty_name.to_string(),
      constructor: Box::new(constructor),
    });
    self.by_type_name.insert(type_name.to_string(), index);
    self.by_pretty_name.insert(pretty_name.to_string(), index);
  }

  /// Instantiates an analysis by type name, stamping its display name
  /// with the registered pretty name.
  pub fn create(&self, type_name: &str) -> Option<Box<dyn Analysis>> {
    let registration = &self.registrations[*self.by_type_name.get(type_name)?];
    let mut analysis = (registration.constructor)();
    analysis
      .state_mut()
      .set_display_name(&registration.pretty_name);
    Some(analysis)
  }

  /// Returns the registered type names, in registration order.
  pub fn registered_names(&self) -> Vec<&str> {
    self
      .registrations
      .iter()
      .map(|r| r.type_name.as_str())
      .collect()
  }

  /// Returns the registered pretty names, in registration order.
  pub fn registered_pretty_names(&self) -> Vec<&str> {
    self
      .registrations
      .iter()
      .map(|r| r.pretty_name.as_str())
      .collect()
  }

  /// Resolves a pretty name back to its type name.
  pub fn name_from_pretty_name(&self, pretty_name: &str) -> Option<&str> {
    self
      .by_pretty_name
      .get(pretty_name)
      .map(|&i| self.registrations[i].type_name.as_str())
  }

  /// Resolves a type name to its pretty name.
  pub fn pretty_name_from_name(&self, type_name: &str) -> Option<&str> {
    self
      .by_type_name
      .get(type_name)
      .map(|&i| self.registrations[i].pretty_name.as_str())
  }

  /// Returns `true` when a type name is registered.
  pub fn contains(&self, type_name: &str) -> bool {
    self.by_type_name.contains_key(type_name)
  }
}
