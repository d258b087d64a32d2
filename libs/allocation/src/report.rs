//! Table views of a schedule and a disbursement.

use serde::Serialize;
use tabled::Tabled;

use crate::disbursement::{AssignmentBreakdown, DisbursementEntry};
use crate::model::{AssignmentRow, Schedule, TaskSummary};

/// One line of the smart-assign summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct SummaryLine {
    #[tabled(rename = "Task")]
    pub task: String,

    #[tabled(rename = "Req'd")]
    pub required: u32,

    #[tabled(rename = "Used")]
    pub used: usize,

    #[tabled(rename = "Total")]
    pub total: String,

    #[tabled(rename = "Work/Day")]
    pub per_day: String,

    #[tabled(rename = "Orig Days")]
    pub original_days: u32,

    #[tabled(rename = "Actual Days")]
    pub actual_days: u64,

    #[tabled(rename = "Status")]
    pub status: String,
}

impl From<&TaskSummary> for SummaryLine {
    fn from(summary: &TaskSummary) -> Self {
        Self {
            task: summary.task_name.clone(),
            required: summary.required_workers,
            used: summary.workers_used,
            total: summary.total_work.to_string(),
            per_day: summary.daily_capacity.to_string_one_decimal(),
            original_days: summary.original_days,
            actual_days: summary.actual_days,
            status: summary.variance.to_string(),
        }
    }
}

/// One assignment row, formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct AssignmentLine {
    #[tabled(rename = "Date")]
    pub date: String,

    #[tabled(rename = "Worker")]
    pub worker: String,

    #[tabled(rename = "Task")]
    pub task: String,

    #[tabled(rename = "Qty")]
    pub quantity: String,

    #[tabled(rename = "Rate")]
    pub rate: String,

    #[tabled(rename = "Cost")]
    pub cost: String,
}

impl From<&AssignmentRow> for AssignmentLine {
    fn from(row: &AssignmentRow) -> Self {
        Self {
            date: row.date.format("%Y-%m-%d").to_string(),
            worker: row.worker.to_string(),
            task: row.task.to_string(),
            quantity: row.quantity.to_string(),
            rate: row.rate.to_string(),
            cost: row.cost.to_string(),
        }
    }
}

/// Summary table lines, one per scheduled task.
pub fn summary_lines(schedule: &Schedule) -> Vec<SummaryLine> {
    schedule.summaries.iter().map(SummaryLine::from).collect()
}

/// Assignment table lines for the given rows.
pub fn assignment_lines<'a, I>(rows: I) -> Vec<AssignmentLine>
where
    I: IntoIterator<Item = &'a AssignmentRow>,
{
    rows.into_iter().map(AssignmentLine::from).collect()
}

/// One worker's pay, formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct DisbursementLine {
    #[tabled(rename = "Worker")]
    pub worker: String,

    #[tabled(rename = "Gross")]
    pub gross: String,

    #[tabled(rename = "Deductions")]
    pub deductions: String,

    #[tabled(rename = "Net")]
    pub net: String,
}

impl From<&DisbursementEntry> for DisbursementLine {
    fn from(entry: &DisbursementEntry) -> Self {
        Self {
            worker: entry.worker.to_string(),
            gross: entry.gross.to_string(),
            deductions: entry.deductions.to_string(),
            net: entry.net.to_string(),
        }
    }
}

/// One assignment's share of a disbursement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct BreakdownLine {
    #[tabled(rename = "Assignment")]
    pub assignment: String,

    #[tabled(rename = "Work Date")]
    pub work_date: String,

    #[tabled(rename = "Days")]
    pub days: u64,

    #[tabled(rename = "Amount")]
    pub amount: String,
}

impl From<&AssignmentBreakdown> for BreakdownLine {
    fn from(row: &AssignmentBreakdown) -> Self {
        Self {
            assignment: row.assignment.clone(),
            work_date: row.work_date.format("%Y-%m-%d").to_string(),
            days: row.days_in_week,
            amount: row.amount.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Variance;
    use crate::quantity::Quantity;
    use taskwork_id::TaskId;

    #[test]
    fn test_summary_line_formatting() {
        let summary = TaskSummary {
            task: TaskId::parse("TASK-1").unwrap(),
            task_name: "Weeding".to_string(),
            required_workers: 2,
            workers_used: 2,
            total_work: Quantity::from_units(10),
            daily_capacity: Quantity::from_units(6),
            original_days: 3,
            actual_days: 2,
            variance: Variance::Ahead { days: 1 },
        };

        let line = SummaryLine::from(&summary);
        assert_eq!(line.task, "Weeding");
        assert_eq!(line.total, "10.00");
        assert_eq!(line.per_day, "6.0");
        assert_eq!(line.status, "-1d");
    }

    #[test]
    fn test_disbursement_line_formatting() {
        let entry = DisbursementEntry {
            worker: taskwork_id::WorkerId::parse("W1").unwrap(),
            gross: "550".parse().unwrap(),
            deductions: "50.5".parse().unwrap(),
            net: "499.5".parse().unwrap(),
        };
        let line = DisbursementLine::from(&entry);
        assert_eq!(line.gross, "550.00");
        assert_eq!(line.deductions, "50.50");
        assert_eq!(line.net, "499.50");
    }

    #[test]
    fn test_summary_table_headers() {
        let table = tabled::Table::new(Vec::<SummaryLine>::new()).to_string();
        for header in ["Task", "Req'd", "Used", "Work/Day", "Orig Days", "Actual Days", "Status"] {
            assert!(table.contains(header), "missing header {header}");
        }
    }
}
