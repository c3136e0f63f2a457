//! # Analysis Abstraction
//!
//! This module defines the [`Analysis`] trait, the central abstraction of
//! the workbench, together with [`AnalysisState`], the shared bookkeeping
//! every analysis carries: declared typed inputs, declared typed outputs
//! with their view bindings, the parameter schema, bound input data, and
//! produced output data.
//!
//! ## Execution protocol
//!
//! An analysis moves through a fixed lifecycle:
//!
//! 1. **Declaration**: `initialize_input_information`,
//!    `initialize_output_information`, and
//!    `initialize_parameter_information` (re)populate the declared specs by
//!    invoking the subclass hooks. All three are idempotent.
//! 2. **Binding**: [`AnalysisState::set_input`] binds a data object to a
//!    declared input name; binding an undeclared name is a logged no-op.
//! 3. **Run**: [`Analysis::run`] fails fast when no outputs are declared
//!    or a declared input is unbound, then invokes the subclass
//!    [`Analysis::execute`] hook, which performs one logical unit of work
//!    against the statistics engine and calls
//!    [`AnalysisState::set_output`] for every output it can satisfy.
//!
//! Success is decided solely by `execute`'s own result: declared outputs
//! left unset do not flip a successful run to failure, because some
//! analyses (KEGG lookups, for instance) legitimately skip outputs.
//!
//! ## Declaration rules
//!
//! Declaring an input or output with an empty name or empty type is a
//! no-op that leaves the counts unchanged; so is re-declaring an existing
//! name. An output declared without a raw view type registers no raw view
//! at all, and empty view-type entries are skipped when the tree is
//! materialized.
//!
//! ## Events
//!
//! Every `set_output` call emits an [`OutputEvent`] on the installed
//! channel, in call order, naming the output, its data object, and the
//! producing analysis. The driver uses these to patch tree nodes when an
//! analysis is re-run.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::data_object::DataObject;
use crate::engine::StatsEngine;
use crate::error::AnalysisError;
use crate::kegg::KeggClient;
use crate::parameter::{Parameter, ParameterSet, ParameterValue};

/// A declared input: name plus expected runtime type.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
  /// Input name.
  pub name: String,
  /// Expected runtime type string of the bound data object.
  pub type_name: String,
}

/// A supplementary view declared for an output.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputView {
  /// View component type name.
  pub view_type: String,
  /// Human-readable name shown in the browser.
  pub pretty_name: String,
}

/// A declared output: name, type, optional raw view, supplementary views.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
  /// Output name.
  pub name: String,
  /// Runtime type string of the produced data object.
  pub type_name: String,
  /// Default view bound directly to the output node, when declared.
  pub raw_view_type: Option<String>,
  /// Display name for the raw view.
  pub raw_view_pretty_name: Option<String>,
  /// Supplementary views, in declaration order.
  pub views: Vec<OutputView>,
}

impl OutputSpec {
  /// Starts an output declaration.
  pub fn new(name: &str, type_name: &str) -> Self {
    Self {
      name: name.to_string(),
      type_name: type_name.to_string(),
      raw_view_type: None,
      raw_view_pretty_name: None,
      views: Vec::new(),
    }
  }

  /// Declares the raw (default) view; an empty type registers nothing.
  pub fn with_raw_view(mut self, view_type: &str, pretty_name: &str) -> Self {
    if view_type.is_empty() {
      return self;
    }
    self.raw_view_type = Some(view_type.to_string());
    if !pretty_name.is_empty() {
      self.raw_view_pretty_name = Some(pretty_name.to_string());
    }
    self
  }

  /// Declares a supplementary view; an empty type is skipped.
  pub fn with_view(mut self, view_type: &str, pretty_name: &str) -> Self {
    if view_type.is_empty() {
      return self;
    }
    self.views.push(OutputView {
      view_type: view_type.to_string(),
      pretty_name: pretty_name.to_string(),
    });
    self
  }
}

/// Notification emitted for every `set_output` call, in call order.
#[derive(Debug, Clone)]
pub struct OutputEvent {
  /// Uuid of the producing analysis.
  pub analysis_uuid: Uuid,
  /// Name of the output that was set.
  pub output_name: String,
  /// The produced data object.
  pub data_object: Arc<DataObject>,
}

/// External collaborators an `execute` hook may reach.
#[derive(Clone)]
pub struct ExecutionContext {
  /// The statistics runtime.
  pub engine: Arc<dyn StatsEngine>,
  /// The KEGG pathway service client.
  pub kegg: Arc<dyn KeggClient>,
}

/// Shared per-instance state every analysis carries.
#[derive(Default)]
pub struct AnalysisState {
  uuid: Uuid,
  display_name: String,
  input_specs: Vec<InputSpec>,
  output_specs: Vec<OutputSpec>,
  bound_inputs: HashMap<String, Arc<DataObject>>,
  produced_outputs: HashMap<String, Arc<DataObject>>,
  parameters: ParameterSet,
  inputs_declared: bool,
  outputs_declared: bool,
  parameters_declared: bool,
  accept_default_parameter_values: bool,
  abort_requested: bool,
  output_events: Option<mpsc::UnboundedSender<OutputEvent>>,
}

impl AnalysisState {
  /// Creates fresh state with a new uuid.
  pub fn new() -> Self {
    Self {
      uuid: Uuid::new_v4(),
      ..Self::default()
    }
  }

  /// Returns the analysis instance uuid.
  pub fn uuid(&self) -> Uuid {
    self.uuid
  }

  /// Returns the user-facing display name.
  pub fn display_name(&self) -> &str {
    &self.display_name
  }

  /// Sets the user-facing display name.
  pub fn set_display_name(&mut self, name: &str) {
    self.display_name = name.to_string();
  }

  // --- input declarations -------------------------------------------------

  /// Declares a typed input.
  ///
  /// Empty names or types and re-declarations are no-ops; the declared
  /// count is unchanged in those cases.
  pub fn add_input_type(&mut self, name: &str, type_name: &str) {
    if name.trim().is_empty() || type_name.trim().is_empty() {
      tracing::warn!(name, type_name, "input declaration needs a non-empty name and type");
      return;
    }
    if self.has_input(name) {
      return;
    }
    self.input_specs.push(InputSpec {
      name: name.to_string(),
      type_name: type_name.to_string(),
    });
  }

  /// Returns the number of valid input declarations.
  pub fn number_of_inputs(&self) -> usize {
    self.input_specs.len()
  }

  /// Returns the declared input names, in declaration order.
  pub fn input_names(&self) -> Vec<&str> {
    self.input_specs.iter().map(|s| s.name.as_str()).collect()
  }

  /// Returns `true` when an input with that name is declared.
  pub fn has_input(&self, name: &str) -> bool {
    self.input_specs.iter().any(|s| s.name == name)
  }

  /// Returns the declared type of an input.
  pub fn input_type(&self, name: &str) -> Option<&str> {
    self
      .input_specs
      .iter()
      .find(|s| s.name == name)
      .map(|s| s.type_name.as_str())
  }

  /// Binds a data object to a declared input; undeclared names are a
  /// logged no-op.
  pub fn set_input(&mut self, name: &str, data_object: Arc<DataObject>) {
    if !self.has_input(name) {
      tracing::warn!(name, "cannot bind undeclared input");
      return;
    }
    self.bound_inputs.insert(name.to_string(), data_object);
  }

  /// Returns the data object bound to an input.
  pub fn input(&self, name: &str) -> Option<&Arc<DataObject>> {
    self.bound_inputs.get(name)
  }

  /// Clears input declarations and bindings.
  pub fn remove_all_inputs(&mut self) {
    self.bound_inputs.clear();
    self.input_specs.clear();
    self.inputs_declared = false;
  }

  // --- output declarations ------------------------------------------------

  /// Declares a typed output with its view bindings.
  ///
  /// Empty names or types and re-declarations are no-ops.
  pub fn add_output(&mut self, spec: OutputSpec) {
    if spec.name.trim().is_empty() || spec.type_name.trim().is_empty() {
      tracing::warn!(
        name = %spec.name,
        type_name = %spec.type_name,
        "output declaration needs a non-empty name and type"
      );
      return;
    }
    if self.has_output(&spec.name) {
      return;
    }
    self.output_specs.push(spec);
  }

  /// Returns the number of valid output declarations.
  pub fn number_of_outputs(&self) -> usize {
    self.output_specs.len()
  }

  /// Returns the declared output names, in declaration order.
  pub fn output_names(&self) -> Vec<&str> {
    self.output_specs.iter().map(|s| s.name.as_str()).collect()
  }

  /// Returns `true` when an output with that name is declared.
  pub fn has_output(&self, name: &str) -> bool {
    self.output_specs.iter().any(|s| s.name == name)
  }

  /// Returns the full declaration of an output.
  pub fn output_spec(&self, name: &str) -> Option<&OutputSpec> {
    self.output_specs.iter().find(|s| s.name == name)
  }

  /// Returns the declared output specs, in declaration order.
  pub fn output_specs(&self) -> &[OutputSpec] {
    &self.output_specs
  }

  /// Returns the raw view type declared for an output, if any.
  pub fn raw_view_type_for_output(&self, name: &str) -> Option<&str> {
    self
      .output_spec(name)?
      .raw_view_type
      .as_deref()
  }

  /// Returns the raw view's pretty name for an output, if any.
  pub fn raw_view_pretty_name(&self, name: &str) -> Option<&str> {
    self.output_spec(name)?.raw_view_pretty_name.as_deref()
  }

  /// Returns `true` when the output is declared with exactly that raw
  /// view type. Outputs declared with an empty raw view type match
  /// nothing, including the empty string.
  pub fn has_output_with_raw_view_type(&self, name: &str, raw_view_type: &str) -> bool {
    self
      .raw_view_type_for_output(name)
      .is_some_and(|t| t == raw_view_type)
  }

  /// Returns `true` when the output declares that supplementary view type.
  pub fn has_output_with_view_type(&self, name: &str, view_type: &str) -> bool {
    self
      .output_spec(name)
      .is_some_and(|s| s.views.iter().any(|v| v.view_type == view_type))
  }

  /// Returns the supplementary view types declared for an output.
  pub fn view_types_for_output(&self, name: &str) -> Vec<&str> {
    self
      .output_spec(name)
      .map(|s| s.views.iter().map(|v| v.view_type.as_str()).collect())
      .unwrap_or_default()
  }

  /// Returns the pretty name of one (output, view type) pair.
  pub fn view_pretty_name(&self, name: &str, view_type: &str) -> Option<&str> {
    self
      .output_spec(name)?
      .views
      .iter()
      .find(|v| v.view_type == view_type)
      .map(|v| v.pretty_name.as_str())
  }

  /// Records a produced output and emits an [`OutputEvent`].
  ///
  /// The data object's name must match the output name; mismatches and
  /// undeclared outputs are logged no-ops.
  pub fn set_output(&mut self, name: &str, data_object: DataObject) {
    if !self.has_output(name) {
      tracing::warn!(name, "cannot set undeclared output");
      return;
    }
    if data_object.name() != name {
      tracing::error!(
        output = name,
        data_object = data_object.name(),
        "output name does not match data object name"
      );
      return;
    }
    let data_object = Arc::new(data_object);
    self
      .produced_outputs
      .insert(name.to_string(), Arc::clone(&data_object));
    if let Some(events) = &self.output_events {
      let _ = events.send(OutputEvent {
        analysis_uuid: self.uuid,
        output_name: name.to_string(),
        data_object,
      });
    }
  }

  /// Returns the data object produced for an output.
  pub fn output(&self, name: &str) -> Option<&Arc<DataObject>> {
    self.produced_outputs.get(name)
  }

  /// Clears output declarations and produced data.
  pub fn remove_all_outputs(&mut self) {
    self.produced_outputs.clear();
    self.output_specs.clear();
    self.outputs_declared = false;
  }

  /// Installs the channel on which [`OutputEvent`]s are emitted.
  pub fn set_output_event_sender(&mut self, sender: mpsc::UnboundedSender<OutputEvent>) {
    self.output_events = Some(sender);
  }

  // --- parameters ---------------------------------------------------------

  /// Returns the parameter schema and values.
  pub fn parameters(&self) -> &ParameterSet {
    &self.parameters
  }

  /// Returns the parameter schema and values mutably.
  pub fn parameters_mut(&mut self) -> &mut ParameterSet {
    &mut self.parameters
  }

  /// Adds a named parameter group (declaration-hook helper).
  pub fn add_parameter_group(&mut self, label: &str, parameters: Vec<Parameter>) {
    self.parameters.add_group(label, parameters);
  }

  /// Returns whether the instance runs with unedited defaults.
  pub fn accept_default_parameter_values(&self) -> bool {
    self.accept_default_parameter_values
  }

  /// Sets whether the instance runs with unedited defaults.
  pub fn set_accept_default_parameter_values(&mut self, accept: bool) {
    self.accept_default_parameter_values = accept;
  }

  // --- abort flag ---------------------------------------------------------

  /// Returns the advisory abort flag; hooks may poll it between steps.
  pub fn abort_requested(&self) -> bool {
    self.abort_requested
  }

  /// Sets the advisory abort flag. Nothing in the core enforces it.
  pub fn set_abort_requested(&mut self, abort: bool) {
    self.abort_requested = abort;
  }

  // --- declaration lifecycle (used by the trait's default methods) --------

  pub(crate) fn inputs_declared(&self) -> bool {
    self.inputs_declared
  }

  pub(crate) fn mark_inputs_declared(&mut self) {
    self.inputs_declared = true;
  }

  pub(crate) fn outputs_declared(&self) -> bool {
    self.outputs_declared
  }

  pub(crate) fn mark_outputs_declared(&mut self) {
    self.outputs_declared = true;
  }

  pub(crate) fn parameters_declared(&self) -> bool {
    self.parameters_declared
  }

  pub(crate) fn mark_parameters_declared(&mut self) {
    self.parameters_declared = true;
  }
}

/// A named, declaratively typed unit of computation.
///
/// Implementations provide the declaration hooks and the [`execute`]
/// hook; the inherited default methods implement the execution protocol
/// described in the module docs.
///
/// [`execute`]: Analysis::execute
#[async_trait]
pub trait Analysis: Send {
  /// Returns the shared state.
  fn state(&self) -> &AnalysisState;

  /// Returns the shared state mutably.
  fn state_mut(&mut self) -> &mut AnalysisState;

  /// Returns the stable registry type name of this analysis.
  fn type_name(&self) -> &'static str;

  /// Declaration hook: declare the typed inputs.
  fn declare_inputs(&mut self);

  /// Declaration hook: declare the typed outputs and their views.
  fn declare_outputs(&mut self);

  /// Declaration hook: declare the parameter schema. Defaults to none.
  fn declare_parameters(&mut self) {}

  /// Performs one logical unit of work against the execution context,
  /// calling `set_output` for every declared output it can satisfy.
  async fn execute(&mut self, ctx: &ExecutionContext) -> Result<(), AnalysisError>;

  /// Idempotently (re)populates the input declarations.
  fn initialize_input_information(&mut self) {
    if self.state().inputs_declared() {
      return;
    }
    self.declare_inputs();
    self.state_mut().mark_inputs_declared();
  }

  /// Idempotently (re)populates the output declarations.
  fn initialize_output_information(&mut self) {
    if self.state().outputs_declared() {
      return;
    }
    self.declare_outputs();
    self.state_mut().mark_outputs_declared();
  }

  /// Idempotently (re)populates the parameter schema, then applies
  /// `overrides` on top of the defaults.
  fn initialize_parameter_information(&mut self, overrides: &HashMap<String, ParameterValue>) {
    if !self.state().parameters_declared() {
      self.declare_parameters();
      self.state_mut().mark_parameters_declared();
    }
    self.state_mut().parameters_mut().set_values(overrides);
  }

  /// Runs the analysis: validates declarations and bindings, then
  /// delegates to [`execute`](Analysis::execute).
  ///
  /// Calling `run` before inputs/outputs are declared fails fast with no
  /// side effects. Success is decided by `execute`'s own result.
  async fn run(&mut self, ctx: &ExecutionContext) -> Result<(), AnalysisError> {
    if self.state().number_of_outputs() == 0 {
      return Err(AnalysisError::NoOutputsDeclared);
    }
    for name in self
      .state()
      .input_names()
      .into_iter()
      .map(str::to_string)
      .collect::<Vec<_>>()
    {
      if self.state().input(&name).is_none() {
        return Err(AnalysisError::MissingInput(name));
      }
    }
    self.execute(ctx).await
  }
}
