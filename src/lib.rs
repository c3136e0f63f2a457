//! # Omics Workbench
//!
//! Headless core of an omics data-visualization workbench in pure Rust.
//!
//! The workbench loads tabular omics data (analytes in rows, samples in
//! columns), runs declaratively-typed statistical analyses against an
//! external statistics engine, and records every input, output, and view
//! in a provenance tree the embedding application browses. Rendering is
//! out of scope: views are managed, named, and bound to data here, drawn
//! elsewhere.
//!
//! ## Key Pieces
//!
//! - **Analyses**: typed inputs, typed outputs with view bindings, a
//!   parameter schema, and one `execute` hook
//! - **Driver**: validates the input contract, runs, and materializes
//!   results into the tree; failed runs leave the tree untouched
//! - **Item tree**: uuid-addressed provenance over inputs, analyses,
//!   outputs, and views, with patch-in-place re-runs
//! - **Seams**: the statistics engine and the KEGG pathway service are
//!   traits, so tests and embedders substitute their own
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use omics_workbench::io::ImportSettings;
//! use omics_workbench::kegg::HttpKeggClient;
//! use omics_workbench::workbench::Workbench;
//! # use omics_workbench::engine::StatsEngine;
//! # fn engine() -> Arc<dyn StatsEngine> { unimplemented!() }
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut workbench = Workbench::new(engine(), Arc::new(HttpKeggClient::new()));
//! let input = workbench.load_delimited_file(
//!   "metabolites.csv",
//!   &ImportSettings::new(),
//!   "Log2",
//! )?;
//! let pca = workbench
//!   .run_analysis("pca", input, &Default::default())
//!   .await?;
//! # let _ = pca;
//! # Ok(())
//! # }
//! ```

// Documentation enforcement - treat missing docs as errors
#![deny(missing_docs)]

/// Analysis trait, shared analysis state, and output declarations.
pub mod analysis;
/// Built-in analyses: PCA, KMeans, correlation, fold change, t-test, KEGG.
pub mod analyses;
/// Data objects: the uuid-stamped payload wrapper and its value types.
pub mod data_object;
/// The analysis driver: validation, execution, and tree materialization.
pub mod driver;
/// Statistics-engine seam and dense matrix conversions.
pub mod engine;
/// Error types, one enum per concern.
pub mod error;
/// Sparse labeled graphs for correlation output.
pub mod graph;
/// Delimited-text import with per-column type detection.
pub mod io;
/// The uuid-addressed provenance tree.
pub mod item_tree;
/// KEGG pathway service client seam.
pub mod kegg;
/// Named in-place table normalization methods.
pub mod normalization;
/// Parameter schemas, values, and validation.
pub mod parameter;
/// Weak handles onto named analysis outputs.
pub mod port;
/// First-wins analysis registry with pretty-name lookup.
pub mod registry;
/// Typed tables of named numeric and text columns.
pub mod table;
/// View trait, factory, and per-node view cache.
pub mod view;
/// The assembled facade over tree, registries, views, and driver.
pub mod workbench;

#[cfg(test)]
mod analysis_test;
#[cfg(test)]
mod io_test;
#[cfg(test)]
mod normalization_test;
#[cfg(test)]
mod table_test;
#[cfg(test)]
mod view_test;
#[cfg(test)]
mod analyses_test;
