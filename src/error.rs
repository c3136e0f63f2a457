//! # Error Handling System
//!
//! Error types for the workbench core, one enum per concern: analysis
//! execution, driver orchestration, item-tree mutation, view resolution,
//! statistics-engine calls, delimited-text import, and the KEGG client.
//!
//! ## Overview
//!
//! All in-scope failures are recovered locally and reported through
//! `Result`/`Option` return values plus a `tracing` diagnostic; no error in
//! this module is allowed to leave the item tree, an analysis, or the view
//! cache in a partially-mutated state. Declaration mistakes (empty names or
//! types passed to the declaration helpers) are deliberately *not* errors:
//! they are silent no-ops with a logged warning, and callers that need to
//! detect them check the post-condition counts.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised while executing an analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
  /// `run()` was called on an analysis that declares no outputs.
  #[error("analysis declares no outputs, nothing to produce")]
  NoOutputsDeclared,

  /// A declared input has no bound data object.
  #[error("declared input `{0}` has no bound data object")]
  MissingInput(String),

  /// The bound data object's payload is not what the backend call expects.
  #[error("input `{name}` has payload type `{actual}`, expected `{expected}`")]
  InvalidInputPayload {
    /// Input name.
    name: String,
    /// Structural type the analysis expected.
    expected: String,
    /// Structural type actually bound.
    actual: String,
  },

  /// A parameter value is missing or malformed.
  #[error("invalid or missing parameter `{0}`")]
  InvalidParameter(String),

  /// The statistics engine reported a failure.
  #[error(transparent)]
  Engine(#[from] EngineError),

  /// The KEGG service reported a failure.
  #[error(transparent)]
  Kegg(#[from] KeggError),
}

/// Errors raised by the analysis driver before or after a run.
#[derive(Debug, Error)]
pub enum DriverError {
  /// `run_analysis` was called with an empty analysis name.
  #[error("analysis name is an empty string")]
  EmptyAnalysisName,

  /// The registry has no constructor for the requested name.
  #[error("no analysis registered under `{0}`")]
  UnknownAnalysis(String),

  /// The input target node does not exist in the tree.
  #[error("input target node does not exist")]
  MissingInputTarget,

  /// The input target node carries no data object.
  #[error("input target node carries no data object")]
  InputTargetWithoutData,

  /// The analysis declares a number of inputs the driver cannot satisfy.
  #[error("number of inputs provided {provided} is different from the number of inputs expected {expected}")]
  InputArity {
    /// Inputs the driver can bind (always 1).
    provided: usize,
    /// Inputs the analysis declares.
    expected: usize,
  },

  /// The provided input's runtime type does not match the declaration.
  #[error("provided input type `{provided}` is different from the expected input type `{expected}`")]
  InputTypeMismatch {
    /// Type the analysis declared.
    expected: String,
    /// Runtime type of the bound data object.
    provided: String,
  },

  /// The analysis itself failed to run.
  #[error(transparent)]
  Run(#[from] AnalysisError),

  /// No live analysis instance is registered under the given uuid.
  #[error("no live analysis instance for uuid {0}")]
  UnknownAnalysisInstance(Uuid),

  /// Running for the current input requires an active analysis with an
  /// input item above its container.
  #[error("no input item is associated with the active analysis")]
  NoCurrentInput,
}

/// Errors raised by item-tree mutation.
#[derive(Debug, Error)]
pub enum TreeError {
  /// Containers must be created with a non-empty display text.
  #[error("container name is an empty string")]
  EmptyName,

  /// View nodes must be created with a non-empty view type.
  #[error("view type is an empty string")]
  EmptyViewType,

  /// The referenced node is not (or no longer) part of the tree.
  #[error("node is not part of the tree")]
  MissingNode,
}

/// Errors raised while resolving a view for a tree node.
#[derive(Debug, Error)]
pub enum ViewError {
  /// No tree node carries the given uuid.
  #[error("no tree node carries uuid {0}")]
  UnknownUuid(Uuid),

  /// The node has no view type to resolve.
  #[error("node {0} has no view type")]
  MissingViewType(Uuid),

  /// The node has no data object to bind.
  #[error("node {0} has no data object")]
  MissingDataObject(Uuid),

  /// The view factory has no constructor for the type.
  #[error("no view registered under type `{0}`")]
  UnknownViewType(String),
}

/// Errors reported by a statistics engine implementation.
#[derive(Debug, Error)]
pub enum EngineError {
  /// The script itself failed to evaluate.
  #[error("script execution failed: {0}")]
  Script(String),

  /// A requested output array was absent from the engine's response.
  #[error("engine returned no array named `{0}`")]
  MissingArray(String),

  /// A table column could not be converted to a dense numeric array.
  #[error("column `{0}` is not numeric")]
  NonNumericColumn(String),

  /// A returned array had unusable dimensions.
  #[error("array `{name}` has unexpected shape {rows}x{cols}")]
  UnexpectedShape {
    /// Array name in the engine response.
    name: String,
    /// Returned row count.
    rows: usize,
    /// Returned column count.
    cols: usize,
  },
}

/// Errors reported by the KEGG pathway client.
#[derive(Debug, Error)]
pub enum KeggError {
  /// Transport-level failure.
  #[error("kegg request failed: {0}")]
  Http(#[from] reqwest::Error),

  /// The service answered with something other than the expected JSON array.
  #[error("kegg response was malformed: {0}")]
  Malformed(String),
}

/// Errors raised while importing delimited text files.
#[derive(Debug, Error)]
pub enum ImportError {
  /// Underlying file I/O failure.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// CSV-level parse failure.
  #[error(transparent)]
  Csv(#[from] csv::Error),

  /// The file contained no rows at all.
  #[error("file contains no data")]
  Empty,
}
