//! Caller-held assignment ledger.
//!
//! The ledger is what a task work assignment keeps between runs: the
//! assignment rows, the actual work recorded against each row, and the dates
//! that drive its stage. A scheduling run replaces the rows wholesale and only
//! after the whole schedule has been computed.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use taskwork_id::TaskId;
use tracing::{debug, info};

use crate::error::{LedgerError, Overrun, ScheduleError};
use crate::model::{AssignmentRow, Schedule, Task, TaskSummary, WorkerPool};
use crate::quantity::{Amount, Quantity};
use crate::scheduler::schedule;

/// Progress of an assignment, derived from its dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Pending,
    InProgress,
    Completed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        })
    }
}

/// An assignment row plus the work actually done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    #[serde(flatten)]
    pub assignment: AssignmentRow,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_quantity: Option<Quantity>,
}

impl LedgerRow {
    fn new(assignment: AssignmentRow) -> Self {
        Self {
            assignment,
            actual_quantity: None,
        }
    }

    /// Actual as a percentage of assigned, one decimal. Above 100 is allowed.
    pub fn achievement(&self) -> Option<f64> {
        let actual = self.actual_quantity.unwrap_or(Quantity::ZERO);
        actual
            .percent_tenths_of(self.assignment.quantity)
            .map(|tenths| tenths as f64 / 10.0)
    }

    /// Actual quantity at the row's rate.
    pub fn actual_cost(&self) -> Amount {
        self.actual_quantity
            .unwrap_or(Quantity::ZERO)
            .cost(self.assignment.rate)
    }

    fn has_actual(&self) -> bool {
        self.actual_quantity.is_some_and(|q| !q.is_zero())
    }
}

/// Assignment rows and actuals for one task work assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentLedger {
    #[serde(default)]
    start_date: Option<NaiveDate>,

    #[serde(default)]
    completion_date: Option<NaiveDate>,

    #[serde(default)]
    rows: Vec<LedgerRow>,

    /// Total work per task as of the last scheduling run.
    #[serde(default)]
    task_totals: BTreeMap<TaskId, Quantity>,
}

impl AssignmentLedger {
    /// Creates an empty ledger.
    pub fn new(start_date: Option<NaiveDate>) -> Self {
        Self {
            start_date,
            ..Self::default()
        }
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn set_start_date(&mut self, start_date: Option<NaiveDate>) {
        self.start_date = start_date;
    }

    pub fn completion_date(&self) -> Option<NaiveDate> {
        self.completion_date
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    /// Total work recorded for a task at the last run.
    pub fn total_work_for(&self, task: &TaskId) -> Option<Quantity> {
        self.task_totals.get(task).copied()
    }

    /// Runs smart assign from the ledger's start date.
    ///
    /// On success every prior row (and its actuals) is replaced and the
    /// completion date is updated. On error the ledger is left untouched.
    pub fn run_smart_assign(
        &mut self,
        tasks: &[Task],
        workers: &WorkerPool,
    ) -> Result<Vec<TaskSummary>, ScheduleError> {
        let schedule = schedule(tasks, workers, self.start_date)?;
        Ok(self.replace(tasks, schedule))
    }

    /// Replaces rows, task totals and completion date from a finished schedule.
    pub fn replace(&mut self, tasks: &[Task], schedule: Schedule) -> Vec<TaskSummary> {
        let Schedule {
            rows,
            summaries,
            completion_date,
        } = schedule;

        let previous = self.rows.len();
        self.task_totals = tasks
            .iter()
            .filter(|t| t.total_work.is_positive())
            .map(|t| (t.id.clone(), t.total_work))
            .collect();
        self.rows = rows.into_iter().map(LedgerRow::new).collect();
        self.completion_date = completion_date;

        info!(
            previous_rows = previous,
            rows = self.rows.len(),
            completion_date = ?self.completion_date,
            "assignment ledger replaced"
        );

        summaries
    }

    /// Records the actual work done on a row (0-based index).
    pub fn record_actual(
        &mut self,
        index: usize,
        actual: Quantity,
    ) -> Result<&LedgerRow, LedgerError> {
        if actual < Quantity::ZERO {
            return Err(LedgerError::NegativeActual(actual));
        }

        let len = self.rows.len();
        let row = self
            .rows
            .get_mut(index)
            .ok_or(LedgerError::RowOutOfRange { index, len })?;
        row.actual_quantity = Some(actual);
        debug!(index, %actual, worker = %row.assignment.worker, "actual recorded");
        Ok(row)
    }

    /// Sum of assigned cost over all rows.
    pub fn total_estimated_cost(&self) -> Amount {
        self.rows.iter().map(|r| r.assignment.cost).sum()
    }

    /// Sum of actual cost over all rows.
    pub fn total_actual_cost(&self) -> Amount {
        self.rows.iter().map(LedgerRow::actual_cost).sum()
    }

    /// Actual work per task.
    pub fn actual_by_task(&self) -> BTreeMap<&TaskId, Quantity> {
        let mut totals = BTreeMap::new();
        for row in &self.rows {
            if let Some(actual) = row.actual_quantity {
                *totals.entry(&row.assignment.task).or_insert(Quantity::ZERO) += actual;
            }
        }
        totals
    }

    /// Checks that no task's actual work exceeds its total work.
    ///
    /// Individual workers may exceed their own assignment; only the per-task
    /// sum is limited.
    pub fn validate_totals(&self) -> Result<(), LedgerError> {
        let overruns: Vec<Overrun> = self
            .actual_by_task()
            .into_iter()
            .filter_map(|(task, actual)| {
                let total_work = self.task_totals.get(task).copied()?;
                (total_work.is_positive() && actual > total_work).then(|| Overrun {
                    task: task.clone(),
                    actual,
                    total_work,
                })
            })
            .collect();

        if overruns.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::TotalWorkExceeded { overruns })
        }
    }

    /// Checks that every row has actual work recorded.
    pub fn check_submittable(&self) -> Result<(), LedgerError> {
        let rows: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.has_actual())
            .map(|(i, _)| i + 1)
            .collect();

        if rows.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::ZeroActualQuantity { rows })
        }
    }

    /// Current stage.
    pub fn stage(&self) -> Stage {
        if self.completion_date.is_some() {
            Stage::Completed
        } else if self.start_date.is_some() {
            Stage::InProgress
        } else {
            Stage::Pending
        }
    }
}
