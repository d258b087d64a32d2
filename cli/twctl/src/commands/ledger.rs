//! Ledger commands.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use taskwork_allocation::{LedgerRow, Quantity};

use crate::error::CliError;
use crate::output::{
    print_info, print_output, print_single, print_success, print_warning, OutputFormat,
};
use crate::plan::load_plan;
use crate::store;

use super::{CommandContext, DEFAULT_PLAN_FILE};

/// Ledger command.
#[derive(Debug, Args)]
pub struct LedgerCommand {
    /// Ledger file. Defaults to the ledger of the plan given with --plan.
    #[arg(long, global = true, value_name = "PATH")]
    ledger: Option<PathBuf>,

    /// Plan file the ledger belongs to. Defaults to ./plan.toml.
    #[arg(long, global = true, value_name = "PATH")]
    plan: Option<PathBuf>,

    #[command(subcommand)]
    command: LedgerCommands,
}

#[derive(Debug, Subcommand)]
enum LedgerCommands {
    /// Show assignment rows, actuals and totals.
    Show,

    /// Record the actual work done on one row.
    Record(RecordArgs),

    /// Check that the ledger can be submitted.
    Check,
}

#[derive(Debug, Args)]
struct RecordArgs {
    /// Row number as shown by `tw ledger show` (starting at 1).
    #[arg(long)]
    row: usize,

    /// Actual quantity done.
    #[arg(long, allow_negative_numbers = true)]
    actual: Quantity,
}

#[derive(Debug, Serialize, Tabled)]
struct LedgerLine {
    #[tabled(rename = "#")]
    row: usize,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Worker")]
    worker: String,
    #[tabled(rename = "Task")]
    task: String,
    #[tabled(rename = "Assigned")]
    assigned: String,
    #[tabled(rename = "Actual")]
    actual: String,
    #[tabled(rename = "Achievement")]
    achievement: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Actual Cost")]
    actual_cost: String,
}

impl LedgerLine {
    fn new(index: usize, row: &LedgerRow) -> Self {
        Self {
            row: index + 1,
            date: row.assignment.date.format("%Y-%m-%d").to_string(),
            worker: row.assignment.worker.to_string(),
            task: row.assignment.task.to_string(),
            assigned: row.assignment.quantity.to_string(),
            actual: row
                .actual_quantity
                .map(|q| q.to_string())
                .unwrap_or_else(|| "-".to_string()),
            achievement: row
                .achievement()
                .map(|p| format!("{p:.1}%"))
                .unwrap_or_else(|| "-".to_string()),
            cost: row.assignment.cost.to_string(),
            actual_cost: row.actual_cost().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CheckResult {
    ledger: String,
    stale: bool,
    submittable: bool,
    problems: Vec<String>,
}

impl LedgerCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let plan_path = self
            .plan
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PLAN_FILE));
        let ledger_path = ctx.ledger_path(self.ledger.clone(), &plan_path);

        match self.command {
            LedgerCommands::Show => {
                let file = store::load_existing(&ledger_path).await?;
                let ledger = &file.ledger;

                match ctx.format {
                    OutputFormat::Json => {
                        print_single(&serde_json::json!({
                            "ledger": ledger_path.display().to_string(),
                            "stage": ledger.stage(),
                            "start_date": ledger.start_date(),
                            "completion_date": ledger.completion_date(),
                            "rows": ledger.rows(),
                            "total_estimated_cost": ledger.total_estimated_cost().to_string(),
                            "total_actual_cost": ledger.total_actual_cost().to_string(),
                        }));
                    }
                    OutputFormat::Table => {
                        let lines: Vec<LedgerLine> = ledger
                            .rows()
                            .iter()
                            .enumerate()
                            .map(|(i, row)| LedgerLine::new(i, row))
                            .collect();
                        print_output(&lines, ctx.format);

                        print_info(&format!("Stage: {}", ledger.stage()));
                        if let Some(start) = ledger.start_date() {
                            print_info(&format!("Start date: {start}"));
                        }
                        if let Some(done) = ledger.completion_date() {
                            print_info(&format!("Completion date: {done}"));
                        }
                        print_info(&format!(
                            "Total estimated cost: {}",
                            ledger.total_estimated_cost()
                        ));
                        print_info(&format!("Total actual cost: {}", ledger.total_actual_cost()));
                    }
                }
            }

            LedgerCommands::Record(args) => {
                let mut file = store::load_existing(&ledger_path).await?;

                if args.row == 0 {
                    return Err(CliError::from(taskwork_allocation::LedgerError::RowOutOfRange {
                        index: 0,
                        len: file.ledger.rows().len(),
                    })
                    .into());
                }

                let line = {
                    let row = file
                        .ledger
                        .record_actual(args.row - 1, args.actual)
                        .map_err(CliError::from)?;
                    LedgerLine::new(args.row - 1, row)
                };
                file.ledger.validate_totals().map_err(CliError::from)?;
                file.touch();
                store::save(&ledger_path, &file).await?;

                match ctx.format {
                    OutputFormat::Json => print_single(&line),
                    OutputFormat::Table => {
                        print_success(&format!(
                            "Recorded {} on row {} ({} on {})",
                            line.actual, line.row, line.worker, line.date
                        ));
                        print_output(&[line], ctx.format);
                    }
                }
            }

            LedgerCommands::Check => {
                let file = store::load_existing(&ledger_path).await?;

                let stale = if self.plan.is_some() || plan_path.exists() {
                    let loaded = load_plan(&plan_path).await?;
                    file.is_stale(&loaded.hash)
                } else {
                    false
                };

                let errors: Vec<_> = [
                    file.ledger.validate_totals(),
                    file.ledger.check_submittable(),
                ]
                .into_iter()
                .filter_map(|r| r.err())
                .collect();
                let problems = errors.iter().map(ToString::to_string).collect();

                let result = CheckResult {
                    ledger: ledger_path.display().to_string(),
                    stale,
                    submittable: errors.is_empty(),
                    problems,
                };

                match ctx.format {
                    OutputFormat::Json => print_single(&result),
                    OutputFormat::Table => {
                        if result.stale {
                            print_warning(&format!(
                                "{} has changed since the ledger was scheduled; run `tw assign` again",
                                plan_path.display()
                            ));
                        }
                        for problem in &result.problems {
                            print_warning(problem);
                        }
                    }
                }

                if let Some(first) = errors.into_iter().next() {
                    return Err(CliError::from(first).into());
                }

                if ctx.format == OutputFormat::Table {
                    print_success(&format!("{} is ready to submit", ledger_path.display()));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::commands::{Cli, Commands};
    use crate::config::Config;
    use crate::store::LedgerFile;
    use clap::Parser;
    use taskwork_allocation::{AssignmentLedger, LedgerError, Task, TaskId, WorkerId, WorkerPool};

    fn ledger() -> AssignmentLedger {
        let mut ledger = AssignmentLedger::new(Some("2024-01-01".parse().unwrap()));
        let tasks = vec![Task::new(
            TaskId::parse("T1").unwrap(),
            "10".parse().unwrap(),
            "3".parse().unwrap(),
            "100".parse().unwrap(),
        )];
        let pool: WorkerPool = ["W1", "W2"]
            .iter()
            .map(|n| WorkerId::parse(n).unwrap())
            .collect();
        ledger.run_smart_assign(&tasks, &pool).unwrap();
        ledger
    }

    #[test]
    fn ledger_line_without_actual() {
        let ledger = ledger();
        let line = LedgerLine::new(0, &ledger.rows()[0]);
        assert_eq!(line.row, 1);
        assert_eq!(line.worker, "W1");
        assert_eq!(line.assigned, "3.00");
        assert_eq!(line.actual, "-");
        assert_eq!(line.achievement, "0.0%");
        assert_eq!(line.actual_cost, "0.00");
    }

    #[test]
    fn ledger_line_with_actual() {
        let mut ledger = ledger();
        ledger.record_actual(3, "0.5".parse().unwrap()).unwrap();
        let line = LedgerLine::new(3, &ledger.rows()[3]);
        assert_eq!(line.row, 4);
        assert_eq!(line.assigned, "1.00");
        assert_eq!(line.achievement, "50.0%");
        assert_eq!(line.actual_cost, "50.00");
    }

    #[test]
    fn parses_record_arguments() {
        let cli = Cli::try_parse_from([
            "tw", "ledger", "record", "--row", "2", "--actual", "2.5", "--ledger", "week.json",
        ])
        .unwrap();
        let Commands::Ledger(cmd) = cli.command else {
            panic!("expected ledger command");
        };
        assert_eq!(cmd.ledger, Some(PathBuf::from("week.json")));
        let LedgerCommands::Record(args) = cmd.command else {
            panic!("expected record");
        };
        assert_eq!(args.row, 2);
        assert_eq!(args.actual.hundredths(), 250);
    }

    fn ctx() -> CommandContext {
        CommandContext {
            config: Config::default(),
            format: OutputFormat::Json,
        }
    }

    async fn saved_ledger(dir: &Path) -> PathBuf {
        let path = dir.join("plan.ledger.json");
        let mut file = LedgerFile::new(None, None);
        file.ledger = ledger();
        store::save(&path, &file).await.unwrap();
        path
    }

    fn record(path: &Path, row: usize, actual: &str) -> LedgerCommand {
        LedgerCommand {
            ledger: Some(path.to_path_buf()),
            plan: None,
            command: LedgerCommands::Record(RecordArgs {
                row,
                actual: actual.parse().unwrap(),
            }),
        }
    }

    #[tokio::test]
    async fn record_saves_actual() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_ledger(dir.path()).await;

        record(&path, 2, "2.5").run(ctx()).await.unwrap();

        let file = store::load_existing(&path).await.unwrap();
        assert_eq!(file.ledger.rows()[1].actual_quantity, Some("2.5".parse().unwrap()));
        assert_eq!(file.ledger.rows()[0].actual_quantity, None);
    }

    #[tokio::test]
    async fn record_past_total_work_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_ledger(dir.path()).await;
        let before = std::fs::read(&path).unwrap();

        let err = record(&path, 1, "11").run(ctx()).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::Ledger(LedgerError::TotalWorkExceeded { .. }))
        ));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn record_row_zero_is_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_ledger(dir.path()).await;

        let err = record(&path, 0, "1").run(ctx()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::Ledger(LedgerError::RowOutOfRange { .. }))
        ));
    }

    #[tokio::test]
    async fn check_requires_every_actual() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_ledger(dir.path()).await;
        let plan = dir.path().join("plan.toml");
        std::fs::write(&plan, "workers = [\"W1\", \"W2\"]\n").unwrap();

        let check = |path: &Path| LedgerCommand {
            ledger: Some(path.to_path_buf()),
            plan: Some(plan.clone()),
            command: LedgerCommands::Check,
        };

        let err = check(&path).run(ctx()).await.unwrap_err();
        match err.downcast_ref::<CliError>() {
            Some(CliError::Ledger(LedgerError::ZeroActualQuantity { rows })) => {
                assert_eq!(rows, &vec![1, 2, 3, 4]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        for (row, actual) in [(1, "3"), (2, "3"), (3, "3"), (4, "1")] {
            record(&path, row, actual).run(ctx()).await.unwrap();
        }
        check(&path).run(ctx()).await.unwrap();
    }
}
