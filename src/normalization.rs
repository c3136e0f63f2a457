//! # Normalization Registry
//!
//! Named in-place table normalization methods applied at import time.
//! The registry is first-wins and pre-registers `"No"` (leave the table
//! untouched) and `"Log2"` (log2 of every numeric cell; zeros map to
//! negative infinity, following the underlying `f64::log2`).

use crate::table::{Column, Table};

type Normalizer = fn(&mut Table) -> bool;

/// First-wins registry of named normalization methods.
pub struct NormalizerRegistry {
  methods: Vec<(String, Normalizer)>,
}

impl Default for NormalizerRegistry {
  fn default() -> Self {
    Self::new()
  }
}

impl NormalizerRegistry {
  /// Creates a registry with `"No"` and `"Log2"` pre-registered.
  pub fn new() -> Self {
    let mut registry = Self {
      methods: Vec::new(),
    };
    registry.register("No", |_table| true);
    registry.register("Log2", apply_log2);
    registry
  }

  /// Registers a normalization method; collisions and empty names are
  /// logged no-ops.
  pub fn register(&mut self, name: &str, method: Normalizer) {
    if name.trim().is_empty() {
      tracing::warn!("normalization method needs a non-empty name");
      return;
    }
    if self.methods.iter().any(|(n, _)| n == name) {
      tracing::warn!(name, "normalization method already registered");
      return;
    }
    self.methods.push((name.to_string(), method));
  }

  /// Applies the named method in place; unknown names return `false`
  /// and leave the table untouched.
  pub fn apply(&self, name: &str, table: &mut Table) -> bool {
    match self.methods.iter().find(|(n, _)| n == name) {
      Some((_, method)) => method(table),
      None => {
        tracing::warn!(name, "unknown normalization method");
        false
      }
    }
  }

  /// Returns the registered method names, in registration order.
  pub fn registered_names(&self) -> Vec<&str> {
    self.methods.iter().map(|(n, _)| n.as_str()).collect()
  }
}

/// Replaces every numeric cell with its base-2 logarithm.
pub fn apply_log2(table: &mut Table) -> bool {
  for column in table.columns_mut() {
    if let Column::Numeric { values, .. } = column {
      for value in values.iter_mut() {
        *value = value.log2();
      }
    }
  }
  true
}
