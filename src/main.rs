//! weld - a minimal static site builder.
//!
//! Copies HTML pages from a source tree into an output tree, inlining
//! `{{ path/to/fragment.include.html }}` includes and a per-build
//! `{{ cachebust }}` token, and rebuilds whenever the source changes.

mod build;
mod cachebust;
mod cli;
mod config;
mod error;
mod include;
mod logger;
mod render;
mod utils;
mod watch;

use anyhow::Result;
use build::Builder;
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use watch::watch_for_changes_blocking;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SiteConfig::load(&cli)?;
    let builder = Builder::new(&config.build);

    match cli.subcommand() {
        Commands::Build { .. } => {
            builder.run()?;
            Ok(())
        }
        Commands::Watch { .. } => {
            // A broken initial pass is reported, the watcher still starts
            if let Err(e) = builder.run() {
                log!("error"; "initial build failed ({})", e.path().display());
                log!("error"; "{:#}", anyhow::Error::from(e));
            }
            watch_for_changes_blocking(&config, &builder)
        }
    }
}
