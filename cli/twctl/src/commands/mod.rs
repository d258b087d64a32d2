//! CLI commands.

mod assign;
mod disburse;
mod estimate;
mod ledger;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::output::OutputFormat;

/// taskwork CLI - Plan task work, rotate workers across it, and pay them.
#[derive(Debug, Parser)]
#[command(name = "tw")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json). Defaults to the configured format.
    #[arg(long, global = true)]
    format: Option<String>,

    /// Log level or filter directive (e.g. debug, taskwork_allocation=trace).
    #[arg(long, global = true, env = "TW_LOG")]
    log_level: Option<String>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rotate plan workers across the plan's tasks (smart assign).
    Assign(assign::AssignCommand),

    /// Estimate workers and cost for task request lines.
    Estimate(estimate::EstimateCommand),

    /// Inspect and update an assignment ledger.
    Ledger(ledger::LedgerCommand),

    /// Work out weekly worker pay from assignment ledgers.
    Disburse(disburse::DisburseCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;

        let level = self.log_level.as_deref().unwrap_or(&config.log_level);
        crate::logging::init(level, self.log_json);

        let format = OutputFormat::from_name(self.format.as_deref().unwrap_or(&config.format));

        let ctx = CommandContext { config, format };

        match self.command {
            Commands::Assign(cmd) => cmd.run(ctx).await,
            Commands::Estimate(cmd) => cmd.run(ctx).await,
            Commands::Ledger(cmd) => cmd.run(ctx).await,
            Commands::Disburse(cmd) => cmd.run(ctx).await,
            Commands::Version => {
                println!("tw {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub config: Config,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Resolve the ledger path, preferring the flag over the configured location.
    pub fn ledger_path(&self, flag: Option<PathBuf>, plan_path: &Path) -> PathBuf {
        flag.unwrap_or_else(|| self.config.default_ledger_path(plan_path))
    }
}

/// Default plan file name.
pub const DEFAULT_PLAN_FILE: &str = "plan.toml";
