//! Scheduler inputs and outputs.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use taskwork_id::{TaskId, WorkerId};

use crate::quantity::{Amount, Quantity};

/// A unit of required work.
///
/// Zero or unset `daily_target`, `original_days` and `required_workers` fall
/// back to 1 when scheduled; the raw values are kept for estimates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier.
    #[serde(alias = "task")]
    pub id: TaskId,

    /// Display name; the identifier is shown when empty.
    #[serde(default, alias = "task_name")]
    pub name: String,

    /// Total quantity of work required.
    pub total_work: Quantity,

    /// Quantity one worker completes per day.
    #[serde(default)]
    pub daily_target: Quantity,

    /// Pay per unit of work.
    #[serde(default)]
    pub rate: Amount,

    /// Originally estimated number of days.
    #[serde(default, alias = "days")]
    pub original_days: u32,

    /// Originally estimated number of workers.
    #[serde(default, alias = "workers")]
    pub required_workers: u32,
}

impl Task {
    /// Creates a task with default estimates (one day, one worker).
    pub fn new(id: TaskId, total_work: Quantity, daily_target: Quantity, rate: Amount) -> Self {
        Self {
            id,
            name: String::new(),
            total_work,
            daily_target,
            rate,
            original_days: 0,
            required_workers: 0,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_original_days(mut self, days: u32) -> Self {
        self.original_days = days;
        self
    }

    #[must_use]
    pub fn with_required_workers(mut self, workers: u32) -> Self {
        self.required_workers = workers;
        self
    }

    /// Name shown in reports.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }

    /// Daily target used for scheduling (1 when zero or unset).
    pub fn effective_daily_target(&self) -> Quantity {
        if self.daily_target.is_positive() {
            self.daily_target
        } else {
            Quantity::ONE
        }
    }

    /// Original day estimate used for variance (at least 1).
    pub fn effective_original_days(&self) -> u32 {
        self.original_days.max(1)
    }

    /// Worker estimate shown in reports (at least 1).
    pub fn effective_required_workers(&self) -> u32 {
        self.required_workers.max(1)
    }
}

/// Ordered pool of distinct, interchangeable workers.
///
/// Order determines where rotation starts. Duplicates are dropped keeping the
/// first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WorkerPool {
    workers: Vec<WorkerId>,
}

impl WorkerPool {
    /// Builds a pool, dropping repeated workers.
    pub fn new<I>(workers: I) -> Self
    where
        I: IntoIterator<Item = WorkerId>,
    {
        let mut pool = Vec::new();
        for worker in workers {
            if !pool.contains(&worker) {
                pool.push(worker);
            }
        }
        Self { workers: pool }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Worker at a rotation cursor position (wraps around the pool).
    ///
    /// # Panics
    ///
    /// Panics if the pool is empty.
    pub fn at(&self, cursor: usize) -> &WorkerId {
        &self.workers[cursor % self.workers.len()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkerId> {
        self.workers.iter()
    }
}

impl FromIterator<WorkerId> for WorkerPool {
    fn from_iter<I: IntoIterator<Item = WorkerId>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'de> Deserialize<'de> for WorkerPool {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Vec::<WorkerId>::deserialize(deserializer).map(Self::new)
    }
}

/// One worker's share of one task on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRow {
    pub worker: WorkerId,
    pub task: TaskId,
    pub date: NaiveDate,
    pub quantity: Quantity,
    pub rate: Amount,
    pub cost: Amount,
}

/// How the scheduled duration compares with the original estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Variance {
    /// Finishes `days` earlier than estimated.
    Ahead { days: u64 },

    /// Finishes `days` later than estimated.
    Behind { days: u64 },

    /// Finishes exactly as estimated.
    OnTime,
}

impl Variance {
    /// Classifies `actual_days - original_days`.
    pub fn from_days(actual_days: u64, original_days: u64) -> Self {
        match actual_days.cmp(&original_days) {
            std::cmp::Ordering::Greater => Self::Behind {
                days: actual_days - original_days,
            },
            std::cmp::Ordering::Less => Self::Ahead {
                days: original_days - actual_days,
            },
            std::cmp::Ordering::Equal => Self::OnTime,
        }
    }

    /// Signed day difference (positive means behind).
    pub fn signed_days(&self) -> i64 {
        match *self {
            Self::Ahead { days } => -(days as i64),
            Self::Behind { days } => days as i64,
            Self::OnTime => 0,
        }
    }

    pub fn is_ahead(&self) -> bool {
        matches!(self, Self::Ahead { .. })
    }

    pub fn is_behind(&self) -> bool {
        matches!(self, Self::Behind { .. })
    }
}

impl fmt::Display for Variance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ahead { days } => write!(f, "-{days}d"),
            Self::Behind { days } => write!(f, "+{days}d"),
            Self::OnTime => f.write_str("On time"),
        }
    }
}

/// Per-task outcome of a scheduling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task: TaskId,
    pub task_name: String,
    /// Worker estimate carried from the task (at least 1).
    pub required_workers: u32,
    /// Distinct workers that received work on this task.
    pub workers_used: usize,
    pub total_work: Quantity,
    /// Pool size times daily target.
    pub daily_capacity: Quantity,
    pub original_days: u32,
    pub actual_days: u64,
    pub variance: Variance,
}

/// Output of one scheduling run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub rows: Vec<AssignmentRow>,
    pub summaries: Vec<TaskSummary>,
    /// Last day any work is assigned; `None` when nothing was scheduled.
    pub completion_date: Option<NaiveDate>,
}

impl Schedule {
    /// Rows for a single task, in assignment order.
    pub fn rows_for<'a>(&'a self, task: &'a TaskId) -> impl Iterator<Item = &'a AssignmentRow> {
        self.rows.iter().filter(move |row| &row.task == task)
    }

    /// Sum of all row costs.
    pub fn total_cost(&self) -> Amount {
        self.rows.iter().map(|row| row.cost).sum()
    }

    /// Total calendar days consumed by all tasks.
    pub fn total_days(&self) -> u64 {
        self.summaries.iter().map(|s| s.actual_days).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
