//! Worker and cost estimates for task work request lines.
//!
//! A request line asks for `total_work` to be done in `days` days by workers
//! who each manage `daily_target` per day. The estimate is how many workers
//! that takes and what they would be paid for the full period.

use serde::Serialize;
use taskwork_id::TaskId;

use crate::model::Task;
use crate::quantity::Amount;

/// Estimate for a single request line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineEstimate {
    pub task: TaskId,
    /// `None` when total work, daily target or days is missing.
    pub workers_needed: Option<u64>,
    pub estimated_cost: Amount,
}

/// Estimates for a whole request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestEstimate {
    pub lines: Vec<LineEstimate>,
    pub total_workers: u64,
    pub total_cost: Amount,
}

/// Estimates workers and cost for one line.
///
/// `workers_needed = ceil(total_work / daily_target / days)`, and the cost is
/// `rate × daily_target × workers_needed × days` (zero without a rate).
pub fn estimate_line(task: &Task) -> LineEstimate {
    let days = u64::from(task.original_days);
    let estimable = task.total_work.is_positive() && task.daily_target.is_positive() && days > 0;
    let workers_needed = estimable.then(|| task.total_work.ceil_div(task.daily_target.times(days)));

    let estimated_cost = match workers_needed {
        Some(workers) if task.rate.is_positive() && workers > 0 => task
            .daily_target
            .cost_times(task.rate, workers.saturating_mul(days)),
        _ => Amount::ZERO,
    };

    LineEstimate {
        task: task.id.clone(),
        workers_needed,
        estimated_cost,
    }
}

/// Estimates every line and totals workers and cost.
pub fn estimate_request<'a, I>(tasks: I) -> RequestEstimate
where
    I: IntoIterator<Item = &'a Task>,
{
    let lines: Vec<LineEstimate> = tasks.into_iter().map(estimate_line).collect();
    let total_workers = lines
        .iter()
        .filter_map(|l| l.workers_needed)
        .fold(0u64, u64::saturating_add);
    let total_cost = lines.iter().map(|l| l.estimated_cost).sum();

    RequestEstimate {
        lines,
        total_workers,
        total_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(total: &str, target: &str, days: u32, rate: &str) -> Task {
        Task::new(
            TaskId::parse("TASK-1").unwrap(),
            total.parse().unwrap(),
            target.parse().unwrap(),
            rate.parse().unwrap(),
        )
        .with_original_days(days)
    }

    #[test]
    fn test_workers_rounded_up() {
        // 100 / 8 = 12.5 worker-days over 3 days -> 4.17 -> 5 workers
        let est = estimate_line(&line("100", "8", 3, "50"));
        assert_eq!(est.workers_needed, Some(5));
        // 50 * 8 * 5 * 3
        assert_eq!(est.estimated_cost, Amount::from_units(6000));
    }

    #[test]
    fn test_missing_inputs_give_no_estimate() {
        assert_eq!(estimate_line(&line("100", "8", 0, "50")).workers_needed, None);
        assert_eq!(estimate_line(&line("0", "8", 3, "50")).workers_needed, None);
        assert_eq!(estimate_line(&line("100", "0", 3, "50")).workers_needed, None);
    }

    #[test]
    fn test_no_rate_means_no_cost() {
        let est = estimate_line(&line("10", "2", 5, "0"));
        assert_eq!(est.workers_needed, Some(1));
        assert_eq!(est.estimated_cost, Amount::ZERO);
    }

    #[test]
    fn test_request_totals() {
        let tasks = vec![
            line("100", "8", 3, "50"),
            line("10", "2", 5, "1.5"),
            line("0", "1", 1, "9"),
        ];
        let est = estimate_request(&tasks);
        assert_eq!(est.lines.len(), 3);
        assert_eq!(est.total_workers, 6);
        // 6000 + 1.5 * 2 * 1 * 5
        assert_eq!(est.total_cost.to_string(), "6015.00");
    }
}
