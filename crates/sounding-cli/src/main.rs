//! Sounding CLI - adaptive evidence gathering from the command line.

use anyhow::Context;
use clap::Parser;
use sounding_cli::commands;
use sounding_cli::{Cli, Command, Config, Formatter};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Log to stderr so JSON output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path = match &cli.config {
        Some(path) => PathBuf::from(path),
        None => Config::path()?,
    };
    let config = Config::load_from(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Depth(args) => commands::execute_depth(args, &formatter)?,
        Command::Gate(args) => commands::execute_gate(args, &formatter)?,
        Command::Research(args) => {
            commands::execute_research(args, &config, &formatter)
                .await
                .context("research session failed")?
        }
    }

    Ok(())
}
