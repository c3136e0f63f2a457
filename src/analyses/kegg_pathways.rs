//! # KEGG Pathway Lookup
//!
//! Looks up, for every analyte named in the first column of the input
//! table, the KEGG pathways it participates in, and reports them as a
//! table of semicolon-joined pathway ids. A lookup failure for one
//! analyte is logged and leaves that row empty instead of failing the
//! whole run.

use async_trait::async_trait;

use crate::analysis::{Analysis, AnalysisState, ExecutionContext, OutputSpec};
use crate::analyses::bound_table;
use crate::data_object::DataObject;
use crate::error::AnalysisError;
use crate::parameter::Parameter;
use crate::table::{Column, Table};

/// Per-analyte KEGG pathway lookup over one table input.
#[derive(Default)]
pub struct KeggPathways {
  state: AnalysisState,
}

impl KeggPathways {
  /// Creates an instance with fresh state.
  pub fn new() -> Self {
    Self {
      state: AnalysisState::new(),
    }
  }
}

#[async_trait]
impl Analysis for KeggPathways {
  fn state(&self) -> &AnalysisState {
    &self.state
  }

  fn state_mut(&mut self) -> &mut AnalysisState {
    &mut self.state
  }

  fn type_name(&self) -> &'static str {
    "kegg-pathways"
  }

  fn declare_inputs(&mut self) {
    self.state.add_input_type("input", "table");
  }

  fn declare_outputs(&mut self) {
    self.state.add_output(
      OutputSpec::new("pathways", "table").with_raw_view("table-view", "Table (pathways)"),
    );
  }

  fn declare_parameters(&mut self) {
    self.state.add_parameter_group(
      "KEGG parameters",
      vec![Parameter::string(
        "host",
        "KEGG server",
        "paraviewweb.kitware.com:88",
      )],
    );
  }

  async fn execute(&mut self, ctx: &ExecutionContext) -> Result<(), AnalysisError> {
    let host = self
      .state
      .parameters()
      .string_parameter("host")
      .ok_or_else(|| AnalysisError::InvalidParameter("host".to_string()))?
      .to_string();

    let analytes: Vec<String> = {
      let table = bound_table(&self.state, "input")?;
      table
        .column(0)
        .and_then(Column::as_text)
        .map(<[String]>::to_vec)
        .unwrap_or_default()
    };

    let mut pathway_cells = Vec::with_capacity(analytes.len());
    for analyte in &analytes {
      match ctx.kegg.pathways_for(&host, analyte).await {
        Ok(pathways) => {
          let joined = pathways
            .iter()
            .map(|p| p.id.as_str())
            .collect::<Vec<_>>()
            .join(";");
          pathway_cells.push(joined);
        }
        Err(err) => {
          tracing::warn!(analyte = %analyte, error = %err, "pathway lookup failed");
          pathway_cells.push(String::new());
        }
      }
    }

    let mut output = Table::new();
    output.push_column(Column::text("header", analytes));
    output.push_column(Column::text("KEGG pathways", pathway_cells));
    self
      .state
      .set_output("pathways", DataObject::table("pathways", output));
    Ok(())
  }
}
