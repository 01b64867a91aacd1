//! Sluice CLI
//!
//! Runs JSON documents through visitor pipelines built from a filter
//! configuration.

mod cli;
mod commands;
mod output;
mod visitors;

use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Run {
            document,
            config,
            mode,
            events,
        } => commands::run::run_filter(document, config.as_deref(), (*mode).into(), *events),
        Commands::Visitors => commands::visitors::run_visitors(),
    }
}
