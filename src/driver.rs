//! # Analysis Driver
//!
//! The [`AnalysisDriver`] owns the execution protocol: instantiate an
//! analysis from the registry, validate its input contract against the
//! selected tree node, bind, run, and materialize the results into the
//! browser tree. A failed run leaves the tree untouched; pending output
//! events from the failed run are drained and discarded so a later run
//! never sees stale patches.
//!
//! ## Materialization layout
//!
//! A successful first run produces one container per analysis instance:
//!
//! ```text
//! <input node>
//! └─ <Pretty Name N>            (container, tagged with the analysis uuid)
//!    ├─ outputs
//!    │  └─ <raw view pretty name>   (output node, one per raw-viewed output)
//!    └─ views
//!       └─ <view pretty name>       (view node, one per declared view)
//! ```
//!
//! Outputs appear in declaration order. An output whose payload is
//! missing or empty is skipped with an error log; an output with no raw
//! view type gets no output node but still gets its view nodes.
//!
//! Re-running via [`AnalysisDriver::update_analysis`] patches the data
//! objects of the already-materialized nodes through the output index
//! instead of growing the tree.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use crate::analysis::{Analysis, ExecutionContext, OutputEvent};
use crate::error::DriverError;
use crate::item_tree::{ItemKind, ItemTree, NodeId};
use crate::parameter::ParameterValue;
use crate::port::SharedAnalysis;
use crate::registry::AnalysisRegistry;

/// Notifications emitted around each run.
#[derive(Debug, Clone)]
pub enum DriverEvent {
  /// Emitted just before an analysis's `run` is awaited.
  AboutToRun {
    /// Analysis instance uuid.
    analysis: Uuid,
    /// Registry type name.
    type_name: String,
    /// Wall-clock timestamp.
    at: DateTime<Utc>,
  },
  /// Re-emitted for every output the analysis set, in call order.
  OutputProduced {
    /// Analysis instance uuid.
    analysis: Uuid,
    /// Output name.
    output_name: String,
  },
  /// Emitted after a run settles, success or not.
  AnalysisCompleted {
    /// Analysis instance uuid.
    analysis: Uuid,
    /// Whether the run succeeded.
    succeeded: bool,
    /// Wall-clock timestamp.
    at: DateTime<Utc>,
  },
}

/// Orchestrates analysis instantiation, validation, execution, and
/// materialization.
pub struct AnalysisDriver {
  context: ExecutionContext,
  analyses: HashMap<Uuid, SharedAnalysis>,
  output_events: mpsc::UnboundedSender<OutputEvent>,
  output_event_receiver: mpsc::UnboundedReceiver<OutputEvent>,
  driver_events: mpsc::UnboundedSender<DriverEvent>,
  driver_event_receiver: Option<mpsc::UnboundedReceiver<DriverEvent>>,
}

impl AnalysisDriver {
  /// Creates a driver over an execution context.
  pub fn new(context: ExecutionContext) -> Self {
    let (output_events, output_event_receiver) = mpsc::unbounded_channel();
    let (driver_events, driver_event_receiver) = mpsc::unbounded_channel();
    Self {
      context,
      analyses: HashMap::new(),
      output_events,
      output_event_receiver,
      driver_events,
      driver_event_receiver: Some(driver_event_receiver),
    }
  }

  /// Takes the driver event receiver; subsequent calls return `None`.
  pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<DriverEvent>> {
    self.driver_event_receiver.take()
  }

  /// Returns the shared handle for a registered analysis instance.
  pub fn analysis(&self, uuid: Uuid) -> Option<&SharedAnalysis> {
    self.analyses.get(&uuid)
  }

  /// Returns the number of registered analysis instances.
  pub fn analysis_count(&self) -> usize {
    self.analyses.len()
  }

  fn drain_output_events(&mut self) -> Vec<OutputEvent> {
    let mut events = Vec::new();
    while let Ok(event) = self.output_event_receiver.try_recv() {
      events.push(event);
    }
    events
  }

  /// Runs a named analysis against the input at `target`, materializing
  /// the results under it on success.
  ///
  /// Validation failures and run failures alike leave the tree and the
  /// instance map untouched.
  pub async fn run_analysis(
    &mut self,
    analysis_name: &str,
    target: NodeId,
    tree: &mut ItemTree,
    registry: &AnalysisRegistry,
    parameter_overrides: &HashMap<String, ParameterValue>,
  ) -> Result<Uuid, DriverError> {
    if analysis_name.trim().is_empty() {
      return Err(DriverError::EmptyAnalysisName);
    }
    let input = {
      let node = tree.node(target).ok_or(DriverError::MissingInputTarget)?;
      if node.kind != ItemKind::Input {
        return Err(DriverError::MissingInputTarget);
      }
      node
        .data
        .clone()
        .ok_or(DriverError::InputTargetWithoutData)?
    };

    let mut analysis = registry
      .create(analysis_name)
      .ok_or_else(|| DriverError::UnknownAnalysis(analysis_name.to_string()))?;

    analysis.state_mut().remove_all_inputs();
    analysis.state_mut().remove_all_outputs();
    analysis.initialize_input_information();
    analysis.initialize_output_information();

    let expected = analysis.state().number_of_inputs();
    if expected != 1 {
      return Err(DriverError::InputArity {
        provided: 1,
        expected,
      });
    }
    let input_name = analysis.state().input_names()[0].to_string();
    let expected_type = analysis
      .state()
      .input_type(&input_name)
      .unwrap_or_default()
      .to_string();
    let provided_type = input.value().type_name().to_string();
    if expected_type != provided_type {
      return Err(DriverError::InputTypeMismatch {
        expected: expected_type,
        provided: provided_type,
      });
    }
    analysis.state_mut().set_input(&input_name, input);
    analysis.initialize_parameter_information(parameter_overrides);
    analysis
      .state_mut()
      .set_accept_default_parameter_values(parameter_overrides.is_empty());
    analysis
      .state_mut()
      .set_output_event_sender(self.output_events.clone());

    let uuid = analysis.state().uuid();
    let type_name = analysis.type_name().to_string();
    let _ = self.driver_events.send(DriverEvent::AboutToRun {
      analysis: uuid,
      type_name: type_name.clone(),
      at: Utc::now(),
    });

    let result = analysis.run(&self.context).await;
    let events = self.drain_output_events();
    if let Err(err) = result {
      let _ = self.driver_events.send(DriverEvent::AnalysisCompleted {
        analysis: uuid,
        succeeded: false,
        at: Utc::now(),
      });
      tracing::error!(analysis = %type_name, error = %err, "analysis run failed");
      return Err(DriverError::Run(err));
    }

    self.add_analysis_to_object_model(analysis.as_ref(), target, tree);
    self
      .analyses
      .insert(uuid, Arc::new(Mutex::new(analysis)));
    for event in events {
      let _ = self.driver_events.send(DriverEvent::OutputProduced {
        analysis: event.analysis_uuid,
        output_name: event.output_name,
      });
    }
    let _ = self.driver_events.send(DriverEvent::AnalysisCompleted {
      analysis: uuid,
      succeeded: true,
      at: Utc::now(),
    });
    Ok(uuid)
  }

  /// Runs a named analysis once per currently selected input node.
  ///
  /// Each run is independent: one failure is logged and skipped without
  /// stopping the rest. Returns the uuids of the successful runs.
  pub async fn run_analysis_for_all_inputs(
    &mut self,
    analysis_name: &str,
    tree: &mut ItemTree,
    registry: &AnalysisRegistry,
  ) -> Vec<Uuid> {
    let targets = tree.selected_input_nodes().to_vec();
    let mut completed = Vec::new();
    for target in targets {
      match self
        .run_analysis(analysis_name, target, tree, registry, &HashMap::new())
        .await
      {
        Ok(uuid) => completed.push(uuid),
        Err(err) => {
          tracing::warn!(analysis = analysis_name, error = %err, "skipping input");
        }
      }
    }
    completed
  }

  /// Runs a named analysis against the input node of the currently
  /// active analysis.
  ///
  /// Fails with [`DriverError::NoCurrentInput`] when no analysis is
  /// active or its container hangs under no input item.
  pub async fn run_analysis_for_current_input(
    &mut self,
    analysis_name: &str,
    tree: &mut ItemTree,
    registry: &AnalysisRegistry,
    parameter_overrides: &HashMap<String, ParameterValue>,
  ) -> Result<Uuid, DriverError> {
    let target = tree
      .active_analysis()
      .and_then(|active| tree.input_node_for_analysis(active))
      .ok_or(DriverError::NoCurrentInput)?;
    self
      .run_analysis(analysis_name, target, tree, registry, parameter_overrides)
      .await
  }

  /// Re-runs a registered analysis with new parameter values, patching
  /// the already-materialized tree nodes in place.
  pub async fn update_analysis(
    &mut self,
    uuid: Uuid,
    tree: &mut ItemTree,
    parameter_overrides: &HashMap<String, ParameterValue>,
  ) -> Result<(), DriverError> {
    let shared = self
      .analyses
      .get(&uuid)
      .cloned()
      .ok_or(DriverError::UnknownAnalysisInstance(uuid))?;
    let mut analysis = shared.lock().await;

    analysis.state_mut().remove_all_outputs();
    analysis.initialize_output_information();
    analysis.initialize_parameter_information(parameter_overrides);
    analysis
      .state_mut()
      .set_accept_default_parameter_values(false);

    let type_name = analysis.type_name().to_string();
    let _ = self.driver_events.send(DriverEvent::AboutToRun {
      analysis: uuid,
      type_name: type_name.clone(),
      at: Utc::now(),
    });
    let result = analysis.run(&self.context).await;
    let events = self.drain_output_events();
    if let Err(err) = result {
      let _ = self.driver_events.send(DriverEvent::AnalysisCompleted {
        analysis: uuid,
        succeeded: false,
        at: Utc::now(),
      });
      tracing::error!(analysis = %type_name, error = %err, "analysis update failed");
      return Err(DriverError::Run(err));
    }

    for event in events {
      for node in tree.find_items_with_output_name(event.analysis_uuid, &event.output_name) {
        if tree
          .set_node_data(node, Arc::clone(&event.data_object))
          .is_err()
        {
          tracing::warn!(output = %event.output_name, "stale output node during update");
        }
      }
      let _ = self.driver_events.send(DriverEvent::OutputProduced {
        analysis: event.analysis_uuid,
        output_name: event.output_name,
      });
    }
    let _ = self.driver_events.send(DriverEvent::AnalysisCompleted {
      analysis: uuid,
      succeeded: true,
      at: Utc::now(),
    });
    Ok(())
  }

  /// Materializes a finished analysis's outputs under the input node.
  fn add_analysis_to_object_model(
    &self,
    analysis: &dyn Analysis,
    target: NodeId,
    tree: &mut ItemTree,
  ) {
    let state = analysis.state();
    let container_text = tree.next_name(state.display_name());
    let Ok(container) = tree.add_container(&container_text, Some(target)) else {
      tracing::error!("analysis container could not be added");
      return;
    };
    tree.set_owner_analysis(container, state.uuid());
    let outputs_node = tree.add_container("outputs", Some(container)).ok();
    let views_node = tree.add_container("views", Some(container)).ok();

    for spec in state.output_specs().to_vec() {
      let Some(data) = state.output(&spec.name).cloned() else {
        tracing::error!(output = %spec.name, "declared output was not produced");
        continue;
      };
      if data.value().is_empty() {
        tracing::error!(output = %spec.name, "declared output is empty");
        continue;
      }
      if let (Some(raw_view), Some(parent)) = (spec.raw_view_type.as_deref(), outputs_node) {
        let text = spec
          .raw_view_pretty_name
          .clone()
          .unwrap_or_else(|| spec.name.clone());
        if let Err(err) = tree.add_output(
          &text,
          raw_view,
          state.uuid(),
          &spec.name,
          Arc::clone(&data),
          Some(parent),
        ) {
          tracing::error!(output = %spec.name, error = %err, "output node rejected");
        }
      }
      if let Some(parent) = views_node {
        for view in &spec.views {
          let text = if view.pretty_name.is_empty() {
            spec.name.clone()
          } else {
            view.pretty_name.clone()
          };
          if let Err(err) = tree.add_view(
            &text,
            &view.view_type,
            state.uuid(),
            &spec.name,
            Arc::clone(&data),
            Some(parent),
          ) {
            tracing::error!(output = %spec.name, error = %err, "view node rejected");
          }
        }
      }
    }
  }
}
