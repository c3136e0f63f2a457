//! # Workbench Facade
//!
//! [`Workbench`] wires the pieces together: one item tree, one analysis
//! registry pre-loaded with the built-ins, one normalization registry,
//! one view factory plus manager, and one driver over the supplied
//! statistics engine and KEGG client. Embedding applications that need
//! finer control can use the parts directly; the facade covers the
//! common load / run / view loop.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use uuid::Uuid;

use crate::analysis::ExecutionContext;
use crate::data_object::DataObject;
use crate::driver::{AnalysisDriver, DriverEvent};
use crate::engine::StatsEngine;
use crate::error::{DriverError, ImportError, TreeError, ViewError};
use crate::io::{read_delimited_file, ImportSettings};
use crate::item_tree::{ItemTree, NodeId, TreeEvent};
use crate::kegg::KeggClient;
use crate::normalization::NormalizerRegistry;
use crate::parameter::ParameterValue;
use crate::registry::AnalysisRegistry;
use crate::view::{View, ViewEvent, ViewFactory, ViewManager};

/// The assembled workbench core.
pub struct Workbench {
  tree: ItemTree,
  registry: AnalysisRegistry,
  normalizers: NormalizerRegistry,
  view_factory: ViewFactory,
  view_manager: ViewManager,
  driver: AnalysisDriver,
}

impl Workbench {
  /// Creates a workbench over an engine and a KEGG client, with the
  /// built-in analyses registered.
  pub fn new(engine: Arc<dyn StatsEngine>, kegg: Arc<dyn KeggClient>) -> Self {
    Self {
      tree: ItemTree::new(),
      registry: AnalysisRegistry::with_builtin_analyses(),
      normalizers: NormalizerRegistry::new(),
      view_factory: ViewFactory::new(),
      view_manager: ViewManager::new(),
      driver: AnalysisDriver::new(ExecutionContext { engine, kegg }),
    }
  }

  /// Imports a delimited file as a new input node, applying the named
  /// normalization method first.
  pub fn load_delimited_file(
    &mut self,
    path: impl AsRef<Path>,
    settings: &ImportSettings,
    normalization: &str,
  ) -> Result<NodeId, ImportError> {
    let path = path.as_ref();
    let mut table = read_delimited_file(path, settings)?;
    self.normalizers.apply(normalization, &mut table);
    let base = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "data".to_string());
    let text = self.tree.generate_unique_name(&base);
    let data = Arc::new(DataObject::table(text.clone(), table));
    // text was just generated unique and non-empty, insertion cannot fail
    Ok(
      self
        .tree
        .add_input(&text, data, None)
        .unwrap_or_else(|_| unreachable!()),
    )
  }

  /// Runs a registered analysis against one input node.
  pub async fn run_analysis(
    &mut self,
    analysis_name: &str,
    target: NodeId,
    parameter_overrides: &HashMap<String, ParameterValue>,
  ) -> Result<Uuid, DriverError> {
    self
      .driver
      .run_analysis(
        analysis_name,
        target,
        &mut self.tree,
        &self.registry,
        parameter_overrides,
      )
      .await
  }

  /// Runs a registered analysis against every currently selected input
  /// node.
  pub async fn run_analysis_for_all_inputs(&mut self, analysis_name: &str) -> Vec<Uuid> {
    self
      .driver
      .run_analysis_for_all_inputs(analysis_name, &mut self.tree, &self.registry)
      .await
  }

  /// Runs a registered analysis against the input node of the currently
  /// active analysis.
  pub async fn run_analysis_for_current_input(
    &mut self,
    analysis_name: &str,
    parameter_overrides: &HashMap<String, ParameterValue>,
  ) -> Result<Uuid, DriverError> {
    self
      .driver
      .run_analysis_for_current_input(
        analysis_name,
        &mut self.tree,
        &self.registry,
        parameter_overrides,
      )
      .await
  }

  /// Re-runs a live analysis with new parameter values, patching its
  /// tree nodes in place.
  pub async fn update_analysis(
    &mut self,
    analysis: Uuid,
    parameter_overrides: &HashMap<String, ParameterValue>,
  ) -> Result<(), DriverError> {
    self
      .driver
      .update_analysis(analysis, &mut self.tree, parameter_overrides)
      .await
  }

  /// Creates (or reuses) the view for a tree node.
  pub fn create_view(&mut self, uuid: Uuid) -> Result<&mut dyn View, ViewError> {
    self
      .view_manager
      .create_view(uuid, &self.tree, &self.view_factory)
  }

  /// Selects a node, emitting tree events.
  pub fn select(&mut self, node: NodeId) -> Result<(), TreeError> {
    self.tree.select(node)
  }

  /// Selects a node without clearing the selected-input set.
  pub fn extend_selection(&mut self, node: NodeId) -> Result<(), TreeError> {
    self.tree.extend_selection(node)
  }

  /// Removes a node and its subtree, dropping any cached views for it.
  pub fn remove_object(&mut self, node: NodeId) -> Result<(), TreeError> {
    if let Some(item) = self.tree.node(node) {
      self.view_manager.delete_view(item.uuid);
    }
    self.tree.remove_object(node)
  }

  /// Takes the view event receiver; subsequent calls return `None`.
  pub fn take_view_event_receiver(
    &mut self,
  ) -> Option<tokio::sync::mpsc::UnboundedReceiver<ViewEvent>> {
    self.view_manager.take_event_receiver()
  }

  /// Takes the tree event receiver; subsequent calls return `None`.
  pub fn take_tree_event_receiver(
    &mut self,
  ) -> Option<tokio::sync::mpsc::UnboundedReceiver<TreeEvent>> {
    self.tree.take_event_receiver()
  }

  /// Takes the driver event receiver; subsequent calls return `None`.
  pub fn take_driver_event_receiver(
    &mut self,
  ) -> Option<tokio::sync::mpsc::UnboundedReceiver<DriverEvent>> {
    self.driver.take_event_receiver()
  }

  /// Returns the item tree.
  pub fn tree(&self) -> &ItemTree {
    &self.tree
  }

  /// Returns the analysis registry.
  pub fn registry(&self) -> &AnalysisRegistry {
    &self.registry
  }

  /// Returns the analysis registry mutably, for registering extensions.
  pub fn registry_mut(&mut self) -> &mut AnalysisRegistry {
    &mut self.registry
  }

  /// Returns the normalization registry mutably.
  pub fn normalizers_mut(&mut self) -> &mut NormalizerRegistry {
    &mut self.normalizers
  }

  /// Returns the view factory mutably, for registering view types.
  pub fn view_factory_mut(&mut self) -> &mut ViewFactory {
    &mut self.view_factory
  }

  /// Returns the driver.
  pub fn driver(&self) -> &AnalysisDriver {
    &self.driver
  }
}
