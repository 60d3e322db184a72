use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dbexport_core::{BatchReport, ExportSettings, sql_file_name};

use crate::cli::CompileArgs;
use crate::output::{print_error, print_success};

pub fn run(settings: ExportSettings, args: &CompileArgs) -> Result<()> {
    let (manifest, batch) = super::load_batch(settings, &args.manifest)?;
    let report = batch.run(&manifest.jobs);

    let written = write_outputs(&report, &args.out_dir)?;
    print_success(&format!(
        "Compiled {} job(s) into {} file(s) under {}",
        report.compiled.len(),
        written.len(),
        args.out_dir.display()
    ));
    if !report.skipped.is_empty() {
        println!("Skipped {} job(s)", report.skipped.len());
    }

    for failure in &report.failures {
        print_error(&failure.to_string());
    }
    if !report.is_success() {
        anyhow::bail!("{} job(s) failed to compile", report.failures.len());
    }
    Ok(())
}

/// Write one `.sql` file per compiled job and one notebook per catalog.
pub fn write_outputs(report: &BatchReport, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let sql_dir = out_dir.join("sql");
    let notebook_dir = out_dir.join("notebooks");
    for dir in [&sql_dir, &notebook_dir] {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let mut written = Vec::new();
    for export in &report.compiled {
        let path = sql_dir.join(sql_file_name(&export.name));
        write_file(&path, &export.sql)?;
        written.push(path);
    }
    for notebook in report.notebooks() {
        let path = notebook_dir.join(notebook.file_name());
        write_file(&path, &notebook.render())?;
        written.push(path);
    }
    Ok(written)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    tracing::debug!(path = %path.display(), "Writing");
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}
