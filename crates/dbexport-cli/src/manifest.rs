//! Export manifest: the jobs of a run plus the relation metadata they share.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use dbexport_core::{ExportJob, RelationTableOverrides};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Manifest {
    /// Relation names (without the `rel_` prefix) known to the catalogs.
    #[serde(default)]
    pub relations: Vec<String>,

    /// Relation tables whose view definition names another table.
    #[serde(default)]
    pub view_definitions: HashMap<String, String>,

    #[serde(default)]
    pub jobs: Vec<ExportJob>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid manifest {}", path.display()))
    }

    pub fn relation_tables(&self) -> RelationTableOverrides {
        RelationTableOverrides::load(
            self.relations.iter().map(String::as_str),
            &self.view_definitions,
        )
    }

    pub fn job(&self, name: &str) -> Option<&ExportJob> {
        self.jobs.iter().find(|job| job.name() == name)
    }
}
