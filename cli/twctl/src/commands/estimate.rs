//! Estimate command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;
use taskwork_allocation::{estimate_request, LineEstimate, Task};

use crate::output::{print_info, print_output, print_single, print_warning, OutputFormat};
use crate::plan::load_plan;

use super::{CommandContext, DEFAULT_PLAN_FILE};

/// Estimate command - workers and cost needed for each task line.
#[derive(Debug, Args)]
pub struct EstimateCommand {
    /// Plan or request file (TOML). Defaults to ./plan.toml.
    #[arg(long, value_name = "PATH")]
    plan: Option<PathBuf>,
}

#[derive(Debug, Serialize, Tabled)]
struct EstimateLine {
    #[tabled(rename = "Task")]
    task: String,
    #[tabled(rename = "Total")]
    total_work: String,
    #[tabled(rename = "Daily Target")]
    daily_target: String,
    #[tabled(rename = "Days")]
    days: u32,
    #[tabled(rename = "Workers")]
    workers: String,
    #[tabled(rename = "Est. Cost")]
    estimated_cost: String,
}

impl EstimateLine {
    fn new(task: &Task, estimate: &LineEstimate) -> Self {
        Self {
            task: task.display_name().to_string(),
            total_work: task.total_work.to_string(),
            daily_target: task.daily_target.to_string(),
            days: task.original_days,
            workers: estimate
                .workers_needed
                .map(|w| w.to_string())
                .unwrap_or_else(|| "-".to_string()),
            estimated_cost: estimate.estimated_cost.to_string(),
        }
    }
}

impl EstimateCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let plan_path = self
            .plan
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PLAN_FILE));
        let plan = load_plan(&plan_path).await?.plan;

        let estimate = estimate_request(&plan.tasks);

        match ctx.format {
            OutputFormat::Json => print_single(&estimate),
            OutputFormat::Table => {
                let lines: Vec<EstimateLine> = plan
                    .tasks
                    .iter()
                    .zip(&estimate.lines)
                    .map(|(task, line)| EstimateLine::new(task, line))
                    .collect();
                print_output(&lines, ctx.format);

                let missing = estimate
                    .lines
                    .iter()
                    .filter(|l| l.workers_needed.is_none())
                    .count();
                if missing > 0 {
                    print_warning(&format!(
                        "{missing} line(s) need total_work, daily_target and days to be estimated"
                    ));
                }

                print_info(&format!("Total workers: {}", estimate.total_workers));
                print_info(&format!("Total estimated cost: {}", estimate.total_cost));
            }
        }

        Ok(())
    }
}
