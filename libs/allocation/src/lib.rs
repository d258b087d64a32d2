//! Work allocation primitives.
//!
//! This library turns a list of tasks and a pool of interchangeable workers
//! into a day-by-day assignment ledger. Key concepts:
//!
//! - **Task**: a quantity of work with a per-worker daily target and a rate.
//! - **Worker pool**: the ordered set of workers available for one run.
//! - **Rotation cursor**: the next worker in round-robin order, shared by
//!   every task and day of a run.
//! - **Disbursement**: what each worker is owed for one week, from the
//!   actual work recorded in the ledgers that overlap it.
//!
//! # Invariants
//!
//! - Scheduling is a pure function of its inputs
//! - For every scheduled task, assigned quantities sum to its total work
//! - Quantities and amounts are exact to two decimals (integer hundredths)
//! - A failed run produces nothing; callers replace their ledger only on success

mod disbursement;
mod error;
mod estimate;
mod ledger;
mod model;
mod quantity;
mod report;
mod scheduler;

pub use disbursement::{
    week_bounds, weekly_disbursement, AssignmentBreakdown, DisbursementEntry, WeeklyDisbursement,
};
pub use error::{DisbursementError, LedgerError, Overrun, QuantityError, ScheduleError};
pub use estimate::{estimate_line, estimate_request, LineEstimate, RequestEstimate};
pub use ledger::{AssignmentLedger, LedgerRow, Stage};
pub use model::{AssignmentRow, Schedule, Task, TaskSummary, Variance, WorkerPool};
pub use quantity::{Amount, Quantity};
pub use report::{
    assignment_lines, summary_lines, AssignmentLine, BreakdownLine, DisbursementLine, SummaryLine,
};
pub use scheduler::schedule;

pub use taskwork_id::{TaskId, WorkerId};
