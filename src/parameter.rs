//! # Analysis Parameters
//!
//! This module provides the closed, typed parameter schema analyses declare
//! and the parameter editor introspects: ordered named groups of parameters,
//! each an integer range, double range, boolean, free string, or
//! enumeration of string choices, with a default value.
//!
//! ## Overview
//!
//! Declaration and values are kept separate: [`ParameterSet::add_group`]
//! installs the schema and seeds every parameter with its default, while
//! [`ParameterSet::set_value`] overrides one value, rejecting unknown ids
//! and kind mismatches with a logged diagnostic instead of partial state.
//! Typed accessors (`integer_parameter`, `enum_parameter`, ...) are what the
//! analysis `execute` hooks read.

use std::collections::HashMap;

/// The kind (and bounds/choices/default) of a declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterKind {
  /// Integer within an inclusive range.
  Integer {
    /// Minimum accepted value.
    min: i64,
    /// Maximum accepted value.
    max: i64,
    /// Default value.
    default: i64,
  },
  /// Double within an inclusive range.
  Double {
    /// Minimum accepted value.
    min: f64,
    /// Maximum accepted value.
    max: f64,
    /// Default value.
    default: f64,
  },
  /// Boolean flag.
  Boolean {
    /// Default value.
    default: bool,
  },
  /// Free-form string.
  String {
    /// Default value.
    default: String,
  },
  /// One choice out of a fixed list.
  Enum {
    /// Allowed choices, in display order.
    choices: Vec<String>,
    /// Default choice (must be one of `choices`).
    default: String,
  },
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
  /// Stable identifier used by scripts and the editor.
  pub id: String,
  /// Human-readable label.
  pub label: String,
  /// Kind, bounds, and default.
  pub kind: ParameterKind,
}

impl Parameter {
  /// Declares an integer-range parameter.
  pub fn integer(id: &str, label: &str, min: i64, max: i64, default: i64) -> Self {
    Self {
      id: id.to_string(),
      label: label.to_string(),
      kind: ParameterKind::Integer { min, max, default },
    }
  }

  /// Declares a double-range parameter.
  pub fn double(id: &str, label: &str, min: f64, max: f64, default: f64) -> Self {
    Self {
      id: id.to_string(),
      label: label.to_string(),
      kind: ParameterKind::Double { min, max, default },
    }
  }

  /// Declares a boolean parameter.
  pub fn boolean(id: &str, label: &str, default: bool) -> Self {
    Self {
      id: id.to_string(),
      label: label.to_string(),
      kind: ParameterKind::Boolean { default },
    }
  }

  /// Declares a string parameter.
  pub fn string(id: &str, label: &str, default: &str) -> Self {
    Self {
      id: id.to_string(),
      label: label.to_string(),
      kind: ParameterKind::String {
        default: default.to_string(),
      },
    }
  }

  /// Declares an enum parameter; an empty `default` selects the first choice.
  pub fn enumeration(id: &str, label: &str, choices: &[&str], default: &str) -> Self {
    let choices: Vec<String> = choices.iter().map(|c| c.to_string()).collect();
    let default = if default.is_empty() {
      choices.first().cloned().unwrap_or_default()
    } else {
      default.to_string()
    };
    Self {
      id: id.to_string(),
      label: label.to_string(),
      kind: ParameterKind::Enum { choices, default },
    }
  }

  fn default_value(&self) -> ParameterValue {
    match &self.kind {
      ParameterKind::Integer { default, .. } => ParameterValue::Integer(*default),
      ParameterKind::Double { default, .. } => ParameterValue::Double(*default),
      ParameterKind::Boolean { default } => ParameterValue::Boolean(*default),
      ParameterKind::String { default } | ParameterKind::Enum { default, .. } => {
        ParameterValue::String(default.clone())
      }
    }
  }
}

/// An ordered group of parameters, shown together by the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGroup {
  /// Group label.
  pub label: String,
  /// Parameters in declaration order.
  pub parameters: Vec<Parameter>,
}

/// A concrete parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
  /// Integer value.
  Integer(i64),
  /// Double value.
  Double(f64),
  /// Boolean value.
  Boolean(bool),
  /// String or enum-choice value.
  String(String),
}

/// The declared schema plus current values of one analysis instance.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
  groups: Vec<ParameterGroup>,
  values: HashMap<String, ParameterValue>,
}

impl ParameterSet {
  /// Creates an empty parameter set.
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a named group of parameters, seeding each with its default.
  ///
  /// A parameter whose id is already declared is skipped with a warning.
  pub fn add_group(&mut self, label: &str, parameters: Vec<Parameter>) {
    let mut group = ParameterGroup {
      label: label.to_string(),
      parameters: Vec::new(),
    };
    for parameter in parameters {
      if self.parameter(&parameter.id).is_some() {
        tracing::warn!(id = %parameter.id, "parameter already declared, skipping");
        continue;
      }
      self
        .values
        .insert(parameter.id.clone(), parameter.default_value());
      group.parameters.push(parameter);
    }
    self.groups.push(group);
  }

  /// Returns the declared groups in order.
  pub fn groups(&self) -> &[ParameterGroup] {
    &self.groups
  }

  /// Returns the number of declared parameters across all groups.
  pub fn len(&self) -> usize {
    self.groups.iter().map(|g| g.parameters.len()).sum()
  }

  /// Returns `true` when no parameters are declared.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Looks up a declared parameter by id.
  pub fn parameter(&self, id: &str) -> Option<&Parameter> {
    self
      .groups
      .iter()
      .flat_map(|g| g.parameters.iter())
      .find(|p| p.id == id)
  }

  /// Overrides one parameter value.
  ///
  /// Unknown ids, kind mismatches, out-of-range numbers, and enum values
  /// outside the choice list are rejected with a warning; the previous
  /// value stays in place.
  pub fn set_value(&mut self, id: &str, value: ParameterValue) -> bool {
    let Some(parameter) = self.parameter(id) else {
      tracing::warn!(id, "cannot set undeclared parameter");
      return false;
    };
    let accepted = match (&parameter.kind, &value) {
      (ParameterKind::Integer { min, max, .. }, ParameterValue::Integer(v)) => {
        (*min..=*max).contains(v)
      }
      (ParameterKind::Double { min, max, .. }, ParameterValue::Double(v)) => {
        *v >= *min && *v <= *max
      }
      (ParameterKind::Boolean { .. }, ParameterValue::Boolean(_)) => true,
      (ParameterKind::String { .. }, ParameterValue::String(_)) => true,
      (ParameterKind::Enum { choices, .. }, ParameterValue::String(v)) => choices.contains(v),
      _ => false,
    };
    if !accepted {
      tracing::warn!(id, ?value, "rejecting parameter value");
      return false;
    }
    self.values.insert(id.to_string(), value);
    true
  }

  /// Applies a batch of value overrides; invalid entries are skipped.
  pub fn set_values(&mut self, values: &HashMap<String, ParameterValue>) {
    for (id, value) in values {
      self.set_value(id, value.clone());
    }
  }

  /// Returns the current value of a parameter.
  pub fn value(&self, id: &str) -> Option<&ParameterValue> {
    self.values.get(id)
  }

  /// Returns an integer parameter's current value.
  pub fn integer_parameter(&self, id: &str) -> Option<i64> {
    match self.values.get(id) {
      Some(ParameterValue::Integer(v)) => Some(*v),
      _ => None,
    }
  }

  /// Returns a double parameter's current value.
  pub fn double_parameter(&self, id: &str) -> Option<f64> {
    match self.values.get(id) {
      Some(ParameterValue::Double(v)) => Some(*v),
      _ => None,
    }
  }

  /// Returns a boolean parameter's current value.
  pub fn boolean_parameter(&self, id: &str) -> Option<bool> {
    match self.values.get(id) {
      Some(ParameterValue::Boolean(v)) => Some(*v),
      _ => None,
    }
  }

  /// Returns a string parameter's current value.
  pub fn string_parameter(&self, id: &str) -> Option<&str> {
    match self.values.get(id) {
      Some(ParameterValue::String(v)) => Some(v.as_str()),
      _ => None,
    }
  }

  /// Returns an enum parameter's current choice.
  pub fn enum_parameter(&self, id: &str) -> Option<&str> {
    self.string_parameter(id)
  }

  /// Drops all declarations and values.
  pub fn clear(&mut self) {
    self.groups.clear();
    self.values.clear();
  }
}
