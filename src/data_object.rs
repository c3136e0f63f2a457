//! # Data Objects
//!
//! This module provides [`DataObject`], the core value container of the
//! workbench: a named, uniquely identified wrapper around a tabular, graph,
//! matrix, tree, or opaque payload, plus a free-form JSON property bag used
//! by renderers (e.g. numeric ranges, cluster counts).
//!
//! ## Overview
//!
//! Data objects are created when a file is imported or when an analysis
//! produces an output, and from then on are shared immutably: tree nodes
//! hold `Arc<DataObject>` handles, and an updated result replaces the whole
//! object rather than mutating the payload in place. The uuid is assigned at
//! construction and never changes; no two data objects share one.

use std::collections::HashMap;

use uuid::Uuid;

use crate::engine::Matrix;
use crate::graph::Graph;
use crate::table::Table;

/// A nested, named tree payload (e.g. a clustering dendrogram).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeStructure {
  /// Node label.
  pub name: String,
  /// Child subtrees.
  pub children: Vec<TreeStructure>,
}

/// The closed set of payloads a data object can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
  /// No payload yet.
  Empty,
  /// A single numeric value.
  Scalar(f64),
  /// A column-major table.
  Table(Table),
  /// An undirected weighted graph.
  Graph(Graph),
  /// A dense numeric matrix (heat maps and similar image-like payloads).
  Matrix(Matrix),
  /// A nested named tree.
  Tree(TreeStructure),
  /// A payload the core does not interpret.
  Opaque {
    /// Runtime type tag reported for type checking.
    type_name: String,
    /// Raw payload bytes.
    bytes: Vec<u8>,
  },
}

impl DataValue {
  /// Returns the runtime type string used for input/output type checking.
  pub fn type_name(&self) -> &str {
    match self {
      DataValue::Empty => "empty",
      DataValue::Scalar(_) => "scalar",
      DataValue::Table(_) => "table",
      DataValue::Graph(_) => "graph",
      DataValue::Matrix(_) => "matrix",
      DataValue::Tree(_) => "tree",
      DataValue::Opaque { type_name, .. } => type_name,
    }
  }

  /// Returns `true` when there is no payload.
  pub fn is_empty(&self) -> bool {
    matches!(self, DataValue::Empty)
  }
}

/// A named, uniquely identified value container.
#[derive(Debug, Clone)]
pub struct DataObject {
  name: String,
  uuid: Uuid,
  value: DataValue,
  properties: HashMap<String, serde_json::Value>,
}

impl DataObject {
  /// Creates a data object wrapping `value`.
  pub fn new(name: impl Into<String>, value: DataValue) -> Self {
    Self {
      name: name.into(),
      uuid: Uuid::new_v4(),
      value,
      properties: HashMap::new(),
    }
  }

  /// Creates an empty data object (no payload yet).
  pub fn empty(name: impl Into<String>) -> Self {
    Self::new(name, DataValue::Empty)
  }

  /// Convenience constructor for table payloads.
  pub fn table(name: impl Into<String>, table: Table) -> Self {
    Self::new(name, DataValue::Table(table))
  }

  /// Convenience constructor for graph payloads.
  pub fn graph(name: impl Into<String>, graph: Graph) -> Self {
    Self::new(name, DataValue::Graph(graph))
  }

  /// Attaches a renderer-facing metadata property.
  pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
    self.properties.insert(key.into(), value);
    self
  }

  /// Returns the object name.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Returns the immutable unique identifier.
  pub fn uuid(&self) -> Uuid {
    self.uuid
  }

  /// Returns the payload.
  pub fn value(&self) -> &DataValue {
    &self.value
  }

  /// Returns the runtime type string of the payload.
  pub fn type_name(&self) -> &str {
    self.value.type_name()
  }

  /// Returns the table payload, if any.
  pub fn as_table(&self) -> Option<&Table> {
    match &self.value {
      DataValue::Table(table) => Some(table),
      _ => None,
    }
  }

  /// Returns the graph payload, if any.
  pub fn as_graph(&self) -> Option<&Graph> {
    match &self.value {
      DataValue::Graph(graph) => Some(graph),
      _ => None,
    }
  }

  /// Returns the tree payload, if any.
  pub fn as_tree(&self) -> Option<&TreeStructure> {
    match &self.value {
      DataValue::Tree(tree) => Some(tree),
      _ => None,
    }
  }

  /// Returns a metadata property by key.
  pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
    self.properties.get(key)
  }

  /// Iterates over the metadata properties.
  pub fn properties(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
    self.properties.iter()
  }
}
