//! Tests for analysis declarations, binding, output events, and the run
//! protocol.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::analysis::{Analysis, AnalysisState, ExecutionContext, OutputSpec};
use crate::data_object::DataObject;
use crate::engine::{ArrayValue, StatsEngine};
use crate::error::{AnalysisError, EngineError, KeggError};
use crate::kegg::{KeggClient, KeggPathway};
use crate::table::{Column, Table};

struct NullEngine;

#[async_trait]
impl StatsEngine for NullEngine {
  async fn execute(
    &self,
    _script: &str,
    _inputs: HashMap<String, ArrayValue>,
    _requested_outputs: &[&str],
  ) -> Result<HashMap<String, ArrayValue>, EngineError> {
    Ok(HashMap::new())
  }
}

struct NullKegg;

#[async_trait]
impl KeggClient for NullKegg {
  async fn pathways_for(&self, _host: &str, _term: &str) -> Result<Vec<KeggPathway>, KeggError> {
    Ok(Vec::new())
  }
}

fn context() -> ExecutionContext {
  ExecutionContext {
    engine: Arc::new(NullEngine),
    kegg: Arc::new(NullKegg),
  }
}

/// Copies its input table to its single output.
struct PassThrough {
  state: AnalysisState,
}

impl PassThrough {
  fn new() -> Self {
    Self {
      state: AnalysisState::new(),
    }
  }
}

#[async_trait]
impl Analysis for PassThrough {
  fn state(&self) -> &AnalysisState {
    &self.state
  }

  fn state_mut(&mut self) -> &mut AnalysisState {
    &mut self.state
  }

  fn type_name(&self) -> &'static str {
    "pass-through"
  }

  fn declare_inputs(&mut self) {
    self.state.add_input_type("input", "table");
  }

  fn declare_outputs(&mut self) {
    self
      .state
      .add_output(OutputSpec::new("copy", "table").with_raw_view("table-view", "Copy"));
  }

  async fn execute(&mut self, _ctx: &ExecutionContext) -> Result<(), AnalysisError> {
    let table = self
      .state
      .input("input")
      .and_then(|d| d.as_table())
      .cloned()
      .ok_or_else(|| AnalysisError::MissingInput("input".to_string()))?;
    self.state.set_output("copy", DataObject::table("copy", table));
    Ok(())
  }
}

fn small_table() -> Table {
  let mut table = Table::new();
  table.push_column(Column::text("analyte", vec!["alanine".to_string()]));
  table.push_column(Column::numeric("S1", vec![1.0]));
  table
}

#[test]
fn test_empty_declarations_are_no_ops() {
  let mut state = AnalysisState::new();
  state.add_input_type("", "table");
  state.add_input_type("input", "");
  state.add_output(OutputSpec::new("", "table"));
  state.add_output(OutputSpec::new("out", ""));
  assert_eq!(state.number_of_inputs(), 0);
  assert_eq!(state.number_of_outputs(), 0);
}

#[test]
fn test_redeclaration_is_a_no_op() {
  let mut state = AnalysisState::new();
  state.add_input_type("input", "table");
  state.add_input_type("input", "graph");
  assert_eq!(state.number_of_inputs(), 1);
  assert_eq!(state.input_type("input"), Some("table"));
}

#[test]
fn test_raw_view_declared_empty_registers_nothing() {
  let mut state = AnalysisState::new();
  state.add_output(OutputSpec::new("out", "table").with_raw_view("", "Pretty"));
  assert_eq!(state.raw_view_type_for_output("out"), None);
  // an empty probe never matches an output without a raw view
  assert!(!state.has_output_with_raw_view_type("out", ""));
}

#[test]
fn test_has_output_with_raw_view_type_is_per_output() {
  let mut state = AnalysisState::new();
  state.add_output(OutputSpec::new("a", "table").with_raw_view("table-view", "A"));
  state.add_output(OutputSpec::new("b", "table"));
  assert!(state.has_output_with_raw_view_type("a", "table-view"));
  assert!(!state.has_output_with_raw_view_type("b", "table-view"));
}

#[test]
fn test_view_declarations_are_ordered_and_named() {
  let mut state = AnalysisState::new();
  state.add_output(
    OutputSpec::new("out", "table")
      .with_view("plot-a", "First")
      .with_view("", "Skipped")
      .with_view("plot-b", "Second"),
  );
  assert_eq!(state.view_types_for_output("out"), vec!["plot-a", "plot-b"]);
  assert_eq!(state.view_pretty_name("out", "plot-b"), Some("Second"));
}

#[test]
fn test_bind_undeclared_input_is_a_no_op() {
  let mut state = AnalysisState::new();
  state.set_input("input", Arc::new(DataObject::table("input", small_table())));
  assert!(state.input("input").is_none());
}

#[test]
fn test_set_output_requires_matching_data_object_name() {
  let mut state = AnalysisState::new();
  state.add_output(OutputSpec::new("out", "table"));
  state.set_output("out", DataObject::table("misnamed", small_table()));
  assert!(state.output("out").is_none());
  state.set_output("out", DataObject::table("out", small_table()));
  assert!(state.output("out").is_some());
}

#[test]
fn test_output_events_arrive_in_call_order() {
  let (tx, mut rx) = mpsc::unbounded_channel();
  let mut state = AnalysisState::new();
  state.set_output_event_sender(tx);
  state.add_output(OutputSpec::new("a", "table"));
  state.add_output(OutputSpec::new("b", "table"));
  state.set_output("b", DataObject::table("b", small_table()));
  state.set_output("a", DataObject::table("a", small_table()));
  assert_eq!(rx.try_recv().unwrap().output_name, "b");
  assert_eq!(rx.try_recv().unwrap().output_name, "a");
  assert!(rx.try_recv().is_err());
}

#[test]
fn test_initialize_hooks_are_idempotent() {
  let mut analysis = PassThrough::new();
  analysis.initialize_input_information();
  analysis.initialize_input_information();
  analysis.initialize_output_information();
  analysis.initialize_output_information();
  assert_eq!(analysis.state().number_of_inputs(), 1);
  assert_eq!(analysis.state().number_of_outputs(), 1);
}

#[tokio::test]
async fn test_run_without_outputs_fails_fast() {
  let mut analysis = PassThrough::new();
  // outputs never declared
  let err = analysis.run(&context()).await.unwrap_err();
  assert!(matches!(err, AnalysisError::NoOutputsDeclared));
}

#[tokio::test]
async fn test_run_with_unbound_input_fails_fast() {
  let mut analysis = PassThrough::new();
  analysis.initialize_input_information();
  analysis.initialize_output_information();
  let err = analysis.run(&context()).await.unwrap_err();
  assert!(matches!(err, AnalysisError::MissingInput(name) if name == "input"));
}

#[tokio::test]
async fn test_run_produces_declared_output() {
  let mut analysis = PassThrough::new();
  analysis.initialize_input_information();
  analysis.initialize_output_information();
  analysis
    .state_mut()
    .set_input("input", Arc::new(DataObject::table("input", small_table())));
  analysis.run(&context()).await.unwrap();
  let copy = analysis.state().output("copy").unwrap();
  assert_eq!(copy.as_table().unwrap().row_count(), 1);
}

#[test]
fn test_remove_all_outputs_clears_declarations_and_data() {
  let mut analysis = PassThrough::new();
  analysis.initialize_output_information();
  analysis
    .state_mut()
    .set_output("copy", DataObject::table("copy", small_table()));
  analysis.state_mut().remove_all_outputs();
  assert_eq!(analysis.state().number_of_outputs(), 0);
  assert!(analysis.state().output("copy").is_none());
  // re-initialization declares again
  analysis.initialize_output_information();
  assert_eq!(analysis.state().number_of_outputs(), 1);
}
