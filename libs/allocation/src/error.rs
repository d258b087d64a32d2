//! Error types for scheduling and ledger validation.

use std::fmt;

use chrono::NaiveDate;
use taskwork_id::{TaskId, WorkerId};
use thiserror::Error;

use crate::quantity::{Amount, Quantity};

/// Scheduling errors.
///
/// Every variant is raised before any output is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// No start date was supplied.
    #[error("no start date: set a start date before running smart assign")]
    MissingStartDate,

    /// The worker pool is empty.
    #[error("no workers: the worker pool for this plan is empty")]
    EmptyWorkerPool,

    /// A computed assignment date falls outside the supported calendar.
    #[error("assignment dates for task {task} fall outside the supported calendar")]
    CalendarOverflow { task: TaskId },
}

impl ScheduleError {
    /// Returns true if the caller supplied invalid input (as opposed to an
    /// input that is valid but cannot be laid out on the calendar).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::MissingStartDate | Self::EmptyWorkerPool)
    }
}

/// Errors converting or parsing fixed-point values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The value is NaN or infinite.
    #[error("value is not a finite number")]
    NotFinite,

    /// The value does not fit the fixed-point range.
    #[error("value out of range: {0}")]
    OutOfRange(String),

    /// The string is not a decimal number.
    #[error("invalid decimal number: '{0}'")]
    Invalid(String),
}

/// A task whose recorded actual work exceeds its total work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overrun {
    pub task: TaskId,
    pub actual: Quantity,
    pub total_work: Quantity,
}

impl fmt::Display for Overrun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: total actual ({}) exceeds total work ({})",
            self.task, self.actual, self.total_work
        )
    }
}

/// Assignment ledger errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Row index does not exist.
    #[error("row {index} out of range (ledger has {len} rows)")]
    RowOutOfRange { index: usize, len: usize },

    /// Actual quantity is negative.
    #[error("actual quantity cannot be negative: {0}")]
    NegativeActual(Quantity),

    /// The sum of actual work for one or more tasks exceeds its total work.
    #[error(
        "total work exceeded: {}; reduce work from over-performers so the sum stays within the allocation",
        join_overruns(.overruns)
    )]
    TotalWorkExceeded { overruns: Vec<Overrun> },

    /// Rows without actual work block submission (1-based row numbers).
    #[error("actual quantity is 0 on row(s) {}; fill in actual work before submitting", join_rows(.rows))]
    ZeroActualQuantity { rows: Vec<usize> },
}

/// Weekly disbursement errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DisbursementError {
    /// The week ends before it starts.
    #[error("week end {end} is before week start {start}")]
    InvalidWeek { start: NaiveDate, end: NaiveDate },

    /// The ISO week does not exist in that year.
    #[error("week {week} does not exist in {year}")]
    NoSuchWeek { year: i32, week: u32 },

    /// Deductions were given for a worker with no pay this week.
    #[error("worker {0} has no assignments in this week")]
    UnknownWorker(WorkerId),

    /// Deductions cannot be negative.
    #[error("deductions for {worker} cannot be negative: {amount}")]
    NegativeDeduction { worker: WorkerId, amount: Amount },
}

fn join_overruns(overruns: &[Overrun]) -> String {
    overruns
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_rows(rows: &[usize]) -> String {
    rows.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
