//! Disburse command (weekly worker pay).

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use taskwork_allocation::{
    week_bounds, weekly_disbursement, Amount, BreakdownLine, DisbursementLine, WeeklyDisbursement,
    WorkerId,
};

use crate::error::CliError;
use crate::output::{print_info, print_output, print_single, print_warning, OutputFormat};
use crate::store::{self, LedgerFile};

use super::CommandContext;

/// Disburse command - what each worker is owed for one week.
#[derive(Debug, Args)]
pub struct DisburseCommand {
    /// ISO year of the week.
    #[arg(long, requires = "week", conflicts_with_all = ["week_start", "week_end"])]
    year: Option<i32>,

    /// ISO week number (1-53).
    #[arg(long, requires = "year")]
    week: Option<u32>,

    /// First day of the week (YYYY-MM-DD).
    #[arg(long, value_name = "DATE", requires = "week_end")]
    week_start: Option<NaiveDate>,

    /// Last day of the week (YYYY-MM-DD).
    #[arg(long, value_name = "DATE", requires = "week_start")]
    week_end: Option<NaiveDate>,

    /// Ledger files to collect pay from. Repeat for each assignment.
    #[arg(long = "ledger", value_name = "PATH", required = true)]
    ledgers: Vec<PathBuf>,

    /// Deduction for one worker, as WORKER=AMOUNT. Repeatable.
    #[arg(long = "deduction", value_name = "WORKER=AMOUNT", value_parser = parse_deduction)]
    deductions: Vec<(WorkerId, Amount)>,
}

fn parse_deduction(s: &str) -> Result<(WorkerId, Amount), String> {
    let (worker, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected WORKER=AMOUNT, got '{s}'"))?;
    let worker = WorkerId::parse(worker).map_err(|e| e.to_string())?;
    let amount = amount.parse::<Amount>().map_err(|e| e.to_string())?;
    Ok((worker, amount))
}

/// Name a ledger by its assignment, or by its file name.
fn ledger_name(path: &Path, file: &LedgerFile) -> String {
    match &file.assignment {
        Some(id) => id.to_string(),
        None => path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("ledger")
            .to_string(),
    }
}

impl DisburseCommand {
    fn week(&self) -> Result<(NaiveDate, NaiveDate)> {
        match (self.year, self.week, self.week_start, self.week_end) {
            (Some(year), Some(week), _, _) => Ok(week_bounds(year, week).map_err(CliError::from)?),
            (_, _, Some(start), Some(end)) => Ok((start, end)),
            _ => anyhow::bail!("give --year and --week, or --week-start and --week-end"),
        }
    }

    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let (week_start, week_end) = self.week()?;

        let mut files = Vec::with_capacity(self.ledgers.len());
        for path in &self.ledgers {
            let file = store::load_existing(path).await?;
            files.push((ledger_name(path, &file), file));
        }

        let mut disbursement = weekly_disbursement(
            files.iter().map(|(name, file)| (name.as_str(), &file.ledger)),
            week_start,
            week_end,
        )
        .map_err(CliError::from)?;

        for (worker, amount) in &self.deductions {
            disbursement
                .set_deduction(worker, *amount)
                .map_err(CliError::from)?;
        }

        match ctx.format {
            OutputFormat::Json => print_single(&disbursement),
            OutputFormat::Table => print_table(&disbursement, ctx.format),
        }

        Ok(())
    }
}

fn print_table(disbursement: &WeeklyDisbursement, format: OutputFormat) {
    if disbursement.breakdown.is_empty() {
        print_warning(&format!(
            "No assignments overlap {} to {}",
            disbursement.week_start, disbursement.week_end
        ));
        return;
    }

    let entries: Vec<DisbursementLine> =
        disbursement.entries.iter().map(DisbursementLine::from).collect();
    print_output(&entries, format);

    let breakdown: Vec<BreakdownLine> =
        disbursement.breakdown.iter().map(BreakdownLine::from).collect();
    print_output(&breakdown, format);

    print_info(&format!(
        "Week {} to {}: {} worker(s)",
        disbursement.week_start, disbursement.week_end, disbursement.total_workers
    ));
    print_info(&format!(
        "Gross {}, deductions {}, net {}",
        disbursement.total_gross, disbursement.total_deductions, disbursement.total_net
    ));
}
