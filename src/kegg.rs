//! # KEGG Pathway Client
//!
//! A small client seam for the KEGG pathway lookup service. Analyses
//! talk to the [`KeggClient`] trait so tests can substitute a fake; the
//! shipped [`HttpKeggClient`] queries the JSON endpoint
//! `http://<host>/kegg-pathway?term=<analyte>` over [`reqwest`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::KeggError;

/// One pathway hit for an analyte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeggPathway {
  /// Pathway identifier, e.g. `path:hsa00010`.
  pub id: String,
  /// Human-readable pathway title.
  pub name: String,
}

/// Pathway lookup seam.
#[async_trait]
pub trait KeggClient: Send + Sync {
  /// Returns the pathways a named analyte participates in.
  async fn pathways_for(&self, host: &str, term: &str) -> Result<Vec<KeggPathway>, KeggError>;
}

/// HTTP implementation over the JSON pathway endpoint.
#[derive(Default)]
pub struct HttpKeggClient {
  client: reqwest::Client,
}

impl HttpKeggClient {
  /// Creates a client with default connection settings.
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl KeggClient for HttpKeggClient {
  async fn pathways_for(&self, host: &str, term: &str) -> Result<Vec<KeggPathway>, KeggError> {
    let url = format!("http://{host}/kegg-pathway");
    let pathways = self
      .client
      .get(url)
      .query(&[("term", term)])
      .send()
      .await?
      .error_for_status()?
      .json::<Vec<KeggPathway>>()
      .await?;
    Ok(pathways)
  }
}
