//! Assign command (smart assign).

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use taskwork_allocation::{assignment_lines, AssignmentRow, SummaryLine, TaskSummary};
use tracing::info;

use crate::error::CliError;
use crate::output::{
    print_info, print_output, print_single, print_success, print_warning, OutputFormat,
};
use crate::plan::load_plan;
use crate::store::{self, LedgerFile};

use super::{CommandContext, DEFAULT_PLAN_FILE};

/// Assign command - rotate the plan's workers across its tasks day by day.
///
/// Replaces every row in the ledger, including recorded actuals. Nothing is
/// written when the run fails.
#[derive(Debug, Args)]
pub struct AssignCommand {
    /// Plan file (TOML). Defaults to ./plan.toml.
    #[arg(long, value_name = "PATH")]
    plan: Option<PathBuf>,

    /// Start date (YYYY-MM-DD); overrides the plan's start_date.
    #[arg(long, value_name = "DATE")]
    start_date: Option<NaiveDate>,

    /// Ledger file to replace. Defaults to the configured ledger location.
    #[arg(long, value_name = "PATH")]
    ledger: Option<PathBuf>,

    /// Also print every assignment row.
    #[arg(long)]
    rows: bool,

    /// Schedule and print without writing the ledger.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Serialize)]
struct AssignResult<'a> {
    ledger: Option<String>,
    completion_date: Option<NaiveDate>,
    total_estimated_cost: String,
    summaries: &'a [TaskSummary],
    rows: Vec<&'a AssignmentRow>,
}

impl AssignCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let plan_path = self
            .plan
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PLAN_FILE));
        let ledger_path = ctx.ledger_path(self.ledger.clone(), &plan_path);

        let loaded = load_plan(&plan_path).await?;
        let plan = loaded.plan;

        let mut file = store::load(&ledger_path)
            .await?
            .unwrap_or_else(|| LedgerFile::new(plan.assignment.clone(), plan.plan.clone()));

        if file.is_stale(&loaded.hash) {
            print_warning(&format!(
                "{} was built from a different version of {}; its rows will be replaced",
                ledger_path.display(),
                plan_path.display()
            ));
        }

        let start_date = self.start_date.or(plan.start_date).or(file.ledger.start_date());
        file.ledger.set_start_date(start_date);

        let summaries = file
            .ledger
            .run_smart_assign(&plan.tasks, &plan.workers)
            .map_err(CliError::from)?;

        file.plan_hash = Some(loaded.hash);
        file.assignment = plan.assignment.clone().or(file.assignment);
        file.plan = plan.plan.clone().or(file.plan);
        file.touch();

        let late = summaries.iter().filter(|s| s.variance.is_behind()).count();
        if late > 0 {
            print_warning(&format!("{late} task(s) finish later than their original estimate"));
        }

        if self.dry_run {
            info!(ledger = %ledger_path.display(), "dry run, ledger not written");
        } else {
            store::save(&ledger_path, &file).await?;
        }

        let ledger = &file.ledger;
        let completion = ledger
            .completion_date()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());

        match ctx.format {
            OutputFormat::Json => {
                let result = AssignResult {
                    ledger: (!self.dry_run).then(|| ledger_path.display().to_string()),
                    completion_date: ledger.completion_date(),
                    total_estimated_cost: ledger.total_estimated_cost().to_string(),
                    summaries: &summaries,
                    rows: ledger.rows().iter().map(|r| &r.assignment).collect(),
                };
                print_single(&result);
            }
            OutputFormat::Table => {
                print_success(&format!(
                    "Smart assign complete: {} rows across {} task(s), completion date {}",
                    ledger.rows().len(),
                    summaries.len(),
                    completion
                ));

                let lines: Vec<SummaryLine> = summaries.iter().map(SummaryLine::from).collect();
                print_output(&lines, ctx.format);

                if self.rows {
                    let rows = assignment_lines(ledger.rows().iter().map(|r| &r.assignment));
                    print_output(&rows, ctx.format);
                }

                print_info(&format!(
                    "Total estimated cost: {}",
                    ledger.total_estimated_cost()
                ));
                print_info(
                    "Workers rotate across tasks; each task starts the day after the previous one ends.",
                );
                if !self.dry_run {
                    print_info(&format!("Ledger written to {}", ledger_path.display()));
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

    use taskwork_allocation::ScheduleError;

    use crate::config::Config;

    const PLAN: &str = r#"
assignment = "TWA-0001"
start_date = "2024-01-01"
workers = ["W1", "W2"]

[[tasks]]
task = "TASK-A"
total_work = 10
daily_target = 3
rate = 100
days = 3
"#;

    fn ctx() -> CommandContext {
        CommandContext {
            config: Config::default(),
            format: OutputFormat::Json,
        }
    }

    fn command(plan: &Path, ledger: &Path, dry_run: bool) -> AssignCommand {
        AssignCommand {
            plan: Some(plan.to_path_buf()),
            start_date: None,
            ledger: Some(ledger.to_path_buf()),
            rows: false,
            dry_run,
        }
    }

    #[tokio::test]
    async fn assign_writes_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let plan = dir.path().join("plan.toml");
        let ledger = dir.path().join("plan.ledger.json");
        std::fs::write(&plan, PLAN).unwrap();

        command(&plan, &ledger, false).run(ctx()).await.unwrap();

        let file = store::load_existing(&ledger).await.unwrap();
        assert_eq!(file.ledger.rows().len(), 4);
        assert_eq!(file.ledger.completion_date(), Some("2024-01-02".parse().unwrap()));
        assert_eq!(file.assignment.unwrap().as_str(), "TWA-0001");
        assert!(file.plan_hash.unwrap().starts_with("sha256:"));
    }

    #[tokio::test]
    async fn failed_assign_leaves_ledger_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let plan = dir.path().join("plan.toml");
        let ledger = dir.path().join("plan.ledger.json");
        std::fs::write(&plan, PLAN).unwrap();
        command(&plan, &ledger, false).run(ctx()).await.unwrap();
        let before = std::fs::read(&ledger).unwrap();

        std::fs::write(&plan, PLAN.replace(r#"["W1", "W2"]"#, "[]")).unwrap();
        let err = command(&plan, &ledger, false).run(ctx()).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::Schedule(ScheduleError::EmptyWorkerPool))
        ));
        assert_eq!(std::fs::read(&ledger).unwrap(), before);
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let plan = dir.path().join("plan.toml");
        let ledger = dir.path().join("plan.ledger.json");
        std::fs::write(&plan, PLAN).unwrap();

        command(&plan, &ledger, true).run(ctx()).await.unwrap();
        assert!(!ledger.exists());
    }

    #[tokio::test]
    async fn start_date_flag_fills_missing_plan_date() {
        let dir = tempfile::tempdir().unwrap();
        let plan = dir.path().join("plan.toml");
        let ledger = dir.path().join("plan.ledger.json");
        std::fs::write(&plan, PLAN.replace("start_date = \"2024-01-01\"\n", "")).unwrap();

        let err = command(&plan, &ledger, false).run(ctx()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::Schedule(ScheduleError::MissingStartDate))
        ));
        assert!(!ledger.exists());

        let mut cmd = command(&plan, &ledger, false);
        cmd.start_date = Some("2024-03-01".parse().unwrap());
        cmd.run(ctx()).await.unwrap();
        let file = store::load_existing(&ledger).await.unwrap();
        assert_eq!(file.ledger.start_date(), Some("2024-03-01".parse().unwrap()));
    }
}
