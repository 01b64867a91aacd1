//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use sluice_core::filter::FilterMode;

/// Sluice - run documents through visitor pipelines
#[derive(Parser)]
#[command(name = "sluice")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Filter a JSON document through the configured visitors
    Run {
        /// Document to filter
        document: PathBuf,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Document representation to drive
        #[arg(short, long, value_enum, default_value_t = Mode::Stream)]
        mode: Mode,

        /// Print the recorded execution events
        #[arg(long)]
        events: bool,
    },

    /// List built-in visitors and their capabilities
    Visitors,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    #[default]
    Stream,
    Tree,
}

impl From<Mode> for FilterMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Stream => FilterMode::Stream,
            Mode::Tree => FilterMode::Tree,
        }
    }
}
