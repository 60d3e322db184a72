pub mod compile;
pub mod render;
pub mod tables;

use anyhow::Result;
use dbexport_core::{ExportBatch, ExportSettings};

use crate::manifest::Manifest;

/// Load a manifest and build the batch that compiles its jobs.
fn load_batch(
    settings: ExportSettings,
    manifest: &std::path::Path,
) -> Result<(Manifest, ExportBatch)> {
    let manifest = Manifest::load(manifest)?;
    let batch = ExportBatch::new(settings).with_relation_tables(manifest.relation_tables());
    Ok((manifest, batch))
}
