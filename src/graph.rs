//! # Graph Values
//!
//! [`Graph`] is the light-weight undirected, weighted graph payload produced
//! by correlation analyses: vertices are variable labels, edges carry the
//! correlation coefficient between the pair of variables they join.

/// An edge between two vertices, identified by vertex index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphEdge {
  /// Index of the first endpoint.
  pub source: usize,
  /// Index of the second endpoint.
  pub target: usize,
  /// Edge weight (a correlation coefficient for correlation graphs).
  pub weight: f64,
}

/// An undirected, weighted graph over labelled vertices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
  vertices: Vec<String>,
  edges: Vec<GraphEdge>,
}

impl Graph {
  /// Creates an empty graph.
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the index for `label`, adding a vertex when absent.
  pub fn add_vertex(&mut self, label: impl Into<String>) -> usize {
    let label = label.into();
    if let Some(index) = self.vertices.iter().position(|v| *v == label) {
      return index;
    }
    self.vertices.push(label);
    self.vertices.len() - 1
  }

  /// Adds an undirected edge between two labels.
  ///
  /// Self-edges are rejected; vertices are created on demand.
  pub fn add_edge(&mut self, a: impl Into<String>, b: impl Into<String>, weight: f64) {
    let a = a.into();
    let b = b.into();
    if a == b {
      tracing::warn!(vertex = %a, "ignoring self-edge");
      return;
    }
    let source = self.add_vertex(a);
    let target = self.add_vertex(b);
    self.edges.push(GraphEdge {
      source,
      target,
      weight,
    });
  }

  /// Returns the vertex labels in insertion order.
  pub fn vertices(&self) -> &[String] {
    &self.vertices
  }

  /// Returns the edges in insertion order.
  pub fn edges(&self) -> &[GraphEdge] {
    &self.edges
  }

  /// Returns the number of vertices.
  pub fn vertex_count(&self) -> usize {
    self.vertices.len()
  }

  /// Returns the number of edges.
  pub fn edge_count(&self) -> usize {
    self.edges.len()
  }

  /// Returns `true` when an edge joins the two labels, in either direction.
  pub fn has_edge(&self, a: &str, b: &str) -> bool {
    let Some(ia) = self.vertices.iter().position(|v| v == a) else {
      return false;
    };
    let Some(ib) = self.vertices.iter().position(|v| v == b) else {
      return false;
    };
    self
      .edges
      .iter()
      .any(|e| (e.source == ia && e.target == ib) || (e.source == ib && e.target == ia))
  }
}
