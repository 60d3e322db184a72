use anyhow::{Context, Result};
use dbexport_core::{ExportBatch, ExportSettings};

use crate::cli::RenderArgs;
use crate::manifest::Manifest;

pub fn run(settings: ExportSettings, args: &RenderArgs) -> Result<()> {
    let (manifest, batch) = super::load_batch(settings, &args.manifest)?;
    println!("{}", render_job(&manifest, &batch, &args.job)?);
    Ok(())
}

/// Compile a single job of the manifest.
pub fn render_job(manifest: &Manifest, batch: &ExportBatch, name: &str) -> Result<String> {
    let job = manifest
        .job(name)
        .with_context(|| format!("No job named {name} in manifest"))?;

    let mut report = batch.run(std::slice::from_ref(job));
    if let Some(failure) = report.failures.pop() {
        return Err(failure.into());
    }
    report
        .compiled
        .pop()
        .map(|export| export.sql)
        .with_context(|| format!("Job {name} is not exported"))
}
