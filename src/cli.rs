//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// weld static site builder CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Source directory path (relative to project root)
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file name (default: weld.toml)
    #[arg(short = 'C', long, default_value = "weld.toml")]
    pub config: PathBuf,

    /// subcommands (default: watch)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a single build pass and exit
    Build {
        /// Remove the output directory before building
        #[arg(long)]
        clean: bool,
    },

    /// Build once, then rebuild on every change in the source directory
    Watch {
        /// Quiet period in milliseconds before a rebuild starts
        #[arg(short, long)]
        debounce: Option<u64>,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Self::Watch { debounce: None }
    }
}

impl Cli {
    /// The subcommand to run, falling back to `watch`.
    pub fn subcommand(&self) -> Commands {
        self.command.clone().unwrap_or_default()
    }
}
