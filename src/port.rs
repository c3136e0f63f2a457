//! # Output Ports
//!
//! A [`Port`] is a non-owning handle onto one named output of an analysis
//! instance. Ports never cache the payload: every [`Port::resolve`] call
//! reads the producing analysis's current output, so a re-run is always
//! observed. Because the handle is weak, a port outliving its analysis
//! resolves to `None` instead of keeping the instance alive.

use std::sync::{Arc, Weak};

use tokio::sync::Mutex;

use crate::analysis::Analysis;
use crate::data_object::DataObject;

/// An analysis instance shared between the driver and ports.
pub type SharedAnalysis = Arc<Mutex<Box<dyn Analysis>>>;

/// A weak handle onto one named output of an analysis.
#[derive(Clone)]
pub struct Port {
  analysis: Weak<Mutex<Box<dyn Analysis>>>,
  output_name: String,
}

impl Port {
  /// Creates a port onto `output_name` of `analysis`.
  pub fn new(analysis: &SharedAnalysis, output_name: &str) -> Self {
    Self {
      analysis: Arc::downgrade(analysis),
      output_name: output_name.to_string(),
    }
  }

  /// Creates a port not yet attached to any analysis.
  pub fn detached(output_name: &str) -> Self {
    Self {
      analysis: Weak::new(),
      output_name: output_name.to_string(),
    }
  }

  /// Re-points the port at another analysis.
  pub fn set_analysis(&mut self, analysis: &SharedAnalysis) {
    self.analysis = Arc::downgrade(analysis);
  }

  /// Returns the output name this port reads.
  pub fn name(&self) -> &str {
    &self.output_name
  }

  /// Reads the current payload of the named output.
  ///
  /// Returns `None` when the analysis is gone or the output is not set.
  pub async fn resolve(&self) -> Option<Arc<DataObject>> {
    let analysis = self.analysis.upgrade()?;
    let guard = analysis.lock().await;
    guard.state().output(&self.output_name).cloned()
  }
}
