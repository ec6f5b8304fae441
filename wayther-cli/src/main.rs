//! Binary crate for the `wayther` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Table and status-bar JSON output

use clap::Parser;

mod cli;
mod format;
mod logging;
mod prompt;
mod template;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}
