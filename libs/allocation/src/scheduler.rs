//! Rotating work-assignment scheduler ("smart assign").
//!
//! Tasks run back-to-back: each task starts the day after the previous one
//! finishes, even when the pool has spare capacity on that last day. Workers
//! rotate round-robin through a single cursor that is shared by every task in
//! the run, so the first worker of a task is whoever follows the last worker
//! of the previous task.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use taskwork_id::TaskId;
use tracing::{debug, info, instrument};

use crate::error::ScheduleError;
use crate::model::{AssignmentRow, Schedule, Task, TaskSummary, Variance, WorkerPool};

/// Lays out `tasks` over `workers` starting at `start_date`.
///
/// Tasks with no positive `total_work` are skipped: they produce no rows, no
/// summary, and consume no days.
///
/// # Errors
///
/// Fails with [`ScheduleError::MissingStartDate`] or
/// [`ScheduleError::EmptyWorkerPool`] before producing anything.
#[instrument(skip_all, fields(tasks = tasks.len(), workers = workers.len()))]
pub fn schedule(
    tasks: &[Task],
    workers: &WorkerPool,
    start_date: Option<NaiveDate>,
) -> Result<Schedule, ScheduleError> {
    let start_date = start_date.ok_or(ScheduleError::MissingStartDate)?;
    if workers.is_empty() {
        return Err(ScheduleError::EmptyWorkerPool);
    }

    let pool_size = workers.len() as u64;
    let mut rows = Vec::new();
    let mut summaries = Vec::new();
    let mut cursor = 0usize;
    let mut day_offset = 0u64;

    for task in tasks {
        if !task.total_work.is_positive() {
            debug!(task = %task.id, total_work = %task.total_work, "skipping task without work");
            continue;
        }

        let daily_target = task.effective_daily_target();
        let daily_capacity = daily_target.times(pool_size);
        let days_needed = task.total_work.ceil_div(daily_capacity);
        let task_start = add_days(start_date, day_offset, &task.id)?;

        let mut remaining = task.total_work;
        let mut used = BTreeSet::new();

        for day in 0..days_needed {
            if !remaining.is_positive() {
                break;
            }

            let date = add_days(task_start, day, &task.id)?;
            let work_today = remaining.min(daily_capacity);
            let workers_today = work_today.ceil_div(daily_target).min(pool_size);

            for _ in 0..workers_today {
                if !remaining.is_positive() {
                    break;
                }

                let worker = workers.at(cursor);
                let quantity = daily_target.min(remaining);
                rows.push(AssignmentRow {
                    worker: worker.clone(),
                    task: task.id.clone(),
                    date,
                    quantity,
                    rate: task.rate,
                    cost: quantity.cost(task.rate),
                });

                used.insert(worker);
                remaining -= quantity;
                cursor = cursor.wrapping_add(1);
            }
        }

        day_offset += days_needed;

        let original_days = task.effective_original_days();
        let variance = Variance::from_days(days_needed, u64::from(original_days));
        debug!(
            task = %task.id,
            %task_start,
            days_needed,
            workers_used = used.len(),
            %variance,
            "task scheduled"
        );

        summaries.push(TaskSummary {
            task: task.id.clone(),
            task_name: task.display_name().to_string(),
            required_workers: task.effective_required_workers(),
            workers_used: used.len(),
            total_work: task.total_work,
            daily_capacity,
            original_days,
            actual_days: days_needed,
            variance,
        });
    }

    let completion_date = match summaries.last() {
        Some(last) => Some(add_days(start_date, day_offset - 1, &last.task)?),
        None => None,
    };

    info!(
        rows = rows.len(),
        tasks_scheduled = summaries.len(),
        completion_date = ?completion_date,
        "smart assign complete"
    );

    Ok(Schedule {
        rows,
        summaries,
        completion_date,
    })
}

fn add_days(date: NaiveDate, days: u64, task: &TaskId) -> Result<NaiveDate, ScheduleError> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| ScheduleError::CalendarOverflow { task: task.clone() })
}
