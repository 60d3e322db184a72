mod cli;
mod commands;
mod config;
mod manifest;
mod observability;
mod output;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use output::print_error;

fn main() {
    if let Err(e) = run() {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = config::load_settings(cli.config.as_deref())?;

    let level = cli.log_level.as_deref().unwrap_or(&settings.log_level);
    observability::init_tracing(level);

    match &cli.command {
        Commands::Compile(args) => commands::compile::run(settings, args),
        Commands::Render(args) => commands::render::run(settings, args),
        Commands::Tables(args) => commands::tables::run(settings, args),
    }
}
