use anyhow::Result;
use dbexport_core::{ExportBatch, ExportSettings};
use serde::Serialize;

use crate::cli::{OutputFormat, TablesArgs};
use crate::manifest::Manifest;
use crate::output;

#[derive(Debug, Serialize)]
pub struct RelationTable {
    pub relation: String,
    pub table: String,
    pub renamed: bool,
}

pub fn run(settings: ExportSettings, args: &TablesArgs) -> Result<()> {
    let (manifest, batch) = super::load_batch(settings, &args.manifest)?;
    let tables = relation_tables(&manifest, &batch);

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tables)?),
        OutputFormat::Table if tables.is_empty() => println!("No relations found."),
        OutputFormat::Table => {
            let rows = tables.into_iter().map(|t| {
                let renamed = if t.renamed { "yes" } else { "no" };
                [t.relation, t.table, renamed.to_string()]
            });
            println!("{}", output::table(["Relation", "Table", "Renamed"], rows));
        }
    }
    Ok(())
}

/// Resolve the schema-qualified table of every relation in the manifest.
pub fn relation_tables(manifest: &Manifest, batch: &ExportBatch) -> Vec<RelationTable> {
    let overrides = batch.relation_tables();
    manifest
        .relations
        .iter()
        .map(|relation| RelationTable {
            relation: relation.clone(),
            table: overrides.resolve_table_name(relation, batch.dialect()),
            renamed: overrides.is_renamed(relation),
        })
        .collect()
}
