use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "dbexport")]
#[command(about = "Compile export formats into Databricks SQL")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (defaults to ./dbexport.toml when present)
    #[arg(short, long, global = true, env = "DBEXPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (overrides the settings file, ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile every job of a manifest into SQL files and notebooks
    Compile(CompileArgs),
    /// Print the SQL of a single job
    Render(RenderArgs),
    /// Show the resolved relation table names
    Tables(TablesArgs),
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(clap::Args)]
pub struct CompileArgs {
    /// Path to the manifest JSON file
    #[arg(short, long)]
    pub manifest: PathBuf,
    /// Directory receiving `sql/` and `notebooks/`
    #[arg(short, long, default_value = "out")]
    pub out_dir: PathBuf,
}

#[derive(clap::Args)]
pub struct RenderArgs {
    /// Path to the manifest JSON file
    #[arg(short, long)]
    pub manifest: PathBuf,
    /// Job name (`<catalog>_<collection>_<product>`)
    #[arg(short, long)]
    pub job: String,
}

#[derive(clap::Args)]
pub struct TablesArgs {
    /// Path to the manifest JSON file
    #[arg(short, long)]
    pub manifest: PathBuf,
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}
