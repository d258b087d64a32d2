//! taskwork (tw) - CLI for task work planning
//!
//! Runs smart assign over a plan file, estimates request lines, and keeps
//! the resulting assignment ledger on disk.

use anyhow::Result;
use clap::Parser;

mod commands;
mod config;
mod error;
mod logging;
mod output;
mod plan;
mod store;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Run the command
    if let Err(e) = cli.run().await {
        // Print error in a user-friendly way
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
