//! Weekly worker disbursements.
//!
//! A disbursement pays every worker on the assignments whose period overlaps
//! one week. Gross pay is the actual cost of the worker's rows, net pay is
//! gross minus deductions. The period of an assignment runs from its start
//! date to its completion date, or to the end of the week while it is still
//! open.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate, Weekday};
use serde::Serialize;
use taskwork_id::WorkerId;
use tracing::{debug, info};

use crate::error::DisbursementError;
use crate::ledger::AssignmentLedger;
use crate::quantity::Amount;

/// Pay for one worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisbursementEntry {
    pub worker: WorkerId,
    pub gross: Amount,
    pub deductions: Amount,
    pub net: Amount,
}

/// Pay attributed to one assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentBreakdown {
    pub assignment: String,
    /// First day of the assignment that falls inside the week.
    pub work_date: NaiveDate,
    pub days_in_week: u64,
    pub amount: Amount,
}

/// Worker payments and totals for one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyDisbursement {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub entries: Vec<DisbursementEntry>,
    pub breakdown: Vec<AssignmentBreakdown>,
    pub total_gross: Amount,
    pub total_deductions: Amount,
    pub total_net: Amount,
    pub total_workers: usize,
}

impl WeeklyDisbursement {
    /// Payment for a worker, if they worked this week.
    pub fn entry(&self, worker: &WorkerId) -> Option<&DisbursementEntry> {
        self.entries.iter().find(|e| &e.worker == worker)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sets a worker's deductions and recomputes their net pay and the totals.
    pub fn set_deduction(
        &mut self,
        worker: &WorkerId,
        deductions: Amount,
    ) -> Result<(), DisbursementError> {
        if deductions < Amount::ZERO {
            return Err(DisbursementError::NegativeDeduction {
                worker: worker.clone(),
                amount: deductions,
            });
        }

        let entry = self
            .entries
            .iter_mut()
            .find(|e| &e.worker == worker)
            .ok_or_else(|| DisbursementError::UnknownWorker(worker.clone()))?;
        entry.deductions = deductions;
        self.calculate_totals();
        Ok(())
    }

    /// Recomputes every net amount and the gross, deduction and net totals.
    pub fn calculate_totals(&mut self) {
        for entry in &mut self.entries {
            entry.net = entry.gross - entry.deductions;
        }
        self.total_gross = self.entries.iter().map(|e| e.gross).sum();
        self.total_deductions = self.entries.iter().map(|e| e.deductions).sum();
        self.total_net = self.entries.iter().map(|e| e.net).sum();
        self.total_workers = self.entries.len();
    }
}

/// Monday and Sunday of an ISO week.
pub fn week_bounds(year: i32, week: u32) -> Result<(NaiveDate, NaiveDate), DisbursementError> {
    let monday = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
        .ok_or(DisbursementError::NoSuchWeek { year, week })?;
    let sunday = monday
        .checked_add_days(Days::new(6))
        .ok_or(DisbursementError::NoSuchWeek { year, week })?;
    Ok((monday, sunday))
}

/// Collects worker pay from the named ledgers whose period overlaps the week.
///
/// Ledgers without a start date have no period and are ignored. Workers are
/// listed in the order they first appear.
pub fn weekly_disbursement<'a, I>(
    ledgers: I,
    week_start: NaiveDate,
    week_end: NaiveDate,
) -> Result<WeeklyDisbursement, DisbursementError>
where
    I: IntoIterator<Item = (&'a str, &'a AssignmentLedger)>,
{
    if week_end < week_start {
        return Err(DisbursementError::InvalidWeek {
            start: week_start,
            end: week_end,
        });
    }

    let mut entries: Vec<DisbursementEntry> = Vec::new();
    let mut index: BTreeMap<&WorkerId, usize> = BTreeMap::new();
    let mut breakdown = Vec::new();

    for (name, ledger) in ledgers {
        let Some(start) = ledger.start_date() else {
            debug!(assignment = name, "skipping ledger without start date");
            continue;
        };
        let end = ledger.completion_date().unwrap_or(week_end);

        let overlap_start = start.max(week_start);
        let overlap_end = end.min(week_end);
        if overlap_end < overlap_start {
            continue;
        }
        let days_in_week = (overlap_end - overlap_start).num_days() as u64 + 1;

        let mut amount = Amount::ZERO;
        for row in ledger.rows() {
            let worker = &row.assignment.worker;
            let cost = row.actual_cost();
            let slot = *index.entry(worker).or_insert_with(|| {
                entries.push(DisbursementEntry {
                    worker: worker.clone(),
                    gross: Amount::ZERO,
                    deductions: Amount::ZERO,
                    net: Amount::ZERO,
                });
                entries.len() - 1
            });
            entries[slot].gross += cost;
            amount += cost;
        }

        breakdown.push(AssignmentBreakdown {
            assignment: name.to_string(),
            work_date: overlap_start,
            days_in_week,
            amount,
        });
    }

    let mut disbursement = WeeklyDisbursement {
        week_start,
        week_end,
        entries,
        breakdown,
        total_gross: Amount::ZERO,
        total_deductions: Amount::ZERO,
        total_net: Amount::ZERO,
        total_workers: 0,
    };
    disbursement.calculate_totals();

    info!(
        %week_start,
        %week_end,
        assignments = disbursement.breakdown.len(),
        workers = disbursement.total_workers,
        total_gross = %disbursement.total_gross,
        "weekly disbursement collected"
    );

    Ok(disbursement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Task, WorkerPool};
    use crate::quantity::Quantity;
    use taskwork_id::TaskId;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn pool(names: &[&str]) -> WorkerPool {
        names.iter().map(|n| WorkerId::parse(n).unwrap()).collect()
    }

    /// 10 units at 3/day and 100 each over W1, W2: rows 3, 3, 3, 1 over two days.
    fn ledger(start: &str, workers: &[&str]) -> AssignmentLedger {
        let mut ledger = AssignmentLedger::new(Some(date(start)));
        let tasks = vec![Task::new(
            TaskId::parse("TASK-A").unwrap(),
            Quantity::from_units(10),
            Quantity::from_units(3),
            Amount::from_units(100),
        )];
        ledger.run_smart_assign(&tasks, &pool(workers)).unwrap();
        ledger
    }

    fn worker(name: &str) -> WorkerId {
        WorkerId::parse(name).unwrap()
    }

    fn first_week_of_2024<'a, I>(ledgers: I) -> WeeklyDisbursement
    where
        I: IntoIterator<Item = (&'a str, &'a AssignmentLedger)>,
    {
        weekly_disbursement(ledgers, date("2024-01-01"), date("2024-01-07")).unwrap()
    }

    #[test]
    fn test_week_bounds_are_iso_weeks() {
        assert_eq!(
            week_bounds(2024, 1).unwrap(),
            (date("2024-01-01"), date("2024-01-07"))
        );
        // 2021-W01 starts in the following January.
        assert_eq!(week_bounds(2021, 1).unwrap().0, date("2021-01-04"));
        assert_eq!(week_bounds(2020, 53).unwrap().1, date("2021-01-03"));
        assert_eq!(
            week_bounds(2021, 53).unwrap_err(),
            DisbursementError::NoSuchWeek {
                year: 2021,
                week: 53
            }
        );
    }

    #[test]
    fn test_gross_is_actual_cost_per_worker() {
        let mut a = ledger("2024-01-01", &["W1", "W2"]);
        a.record_actual(0, Quantity::from_units(3)).unwrap();
        a.record_actual(1, Quantity::from_units(2)).unwrap();
        a.record_actual(2, "2.5".parse().unwrap()).unwrap();

        let mut b = ledger("2024-01-04", &["W2", "W3"]);
        b.record_actual(0, Quantity::ONE).unwrap();

        let out = first_week_of_2024([("TWA-1", &a), ("TWA-2", &b)]);

        let order: Vec<&str> = out.entries.iter().map(|e| e.worker.as_str()).collect();
        assert_eq!(order, vec!["W1", "W2", "W3"]);
        assert_eq!(out.entry(&worker("W1")).unwrap().gross, Amount::from_units(550));
        assert_eq!(out.entry(&worker("W2")).unwrap().gross, Amount::from_units(300));
        assert_eq!(out.entry(&worker("W3")).unwrap().gross, Amount::ZERO);
        assert_eq!(out.total_gross, Amount::from_units(850));
        assert_eq!(out.total_net, out.total_gross);
        assert_eq!(out.total_workers, 3);

        assert_eq!(out.breakdown.len(), 2);
        assert_eq!(out.breakdown[0].amount, Amount::from_units(750));
        assert_eq!(out.breakdown[1].work_date, date("2024-01-04"));
        assert_eq!(out.breakdown[1].days_in_week, 2);
    }

    #[test]
    fn test_overlap_is_clipped_to_the_week() {
        // Runs 2023-12-31 to 2024-01-01; only the Monday falls in 2024-W01.
        let a = ledger("2023-12-31", &["W1", "W2"]);
        let out = first_week_of_2024([("TWA-1", &a)]);
        assert_eq!(out.breakdown[0].work_date, date("2024-01-01"));
        assert_eq!(out.breakdown[0].days_in_week, 1);
    }

    #[test]
    fn test_non_overlapping_and_undated_ledgers_skipped() {
        let before = ledger("2023-12-01", &["W1"]);
        let after = ledger("2024-01-08", &["W2"]);
        let undated = AssignmentLedger::default();

        let out = first_week_of_2024([("old", &before), ("next", &after), ("draft", &undated)]);
        assert!(out.is_empty());
        assert!(out.breakdown.is_empty());
        assert_eq!(out.total_gross, Amount::ZERO);
    }

    #[test]
    fn test_open_ledger_runs_to_week_end() {
        let mut open = AssignmentLedger::new(Some(date("2024-01-05")));
        assert_eq!(open.completion_date(), None);
        let out = first_week_of_2024([("open", &open)]);
        assert_eq!(out.breakdown[0].days_in_week, 3);

        open.set_start_date(Some(date("2024-01-09")));
        let out = first_week_of_2024([("open", &open)]);
        assert!(out.breakdown.is_empty());
    }

    #[test]
    fn test_deductions_reduce_net() {
        let mut a = ledger("2024-01-01", &["W1", "W2"]);
        for i in 0..4 {
            a.record_actual(i, Quantity::from_units(2)).unwrap();
        }
        let mut out = first_week_of_2024([("TWA-1", &a)]);

        out.set_deduction(&worker("W1"), "150.50".parse().unwrap()).unwrap();
        assert_eq!(out.entry(&worker("W1")).unwrap().net.to_string(), "249.50");
        assert_eq!(out.total_deductions.to_string(), "150.50");
        assert_eq!(out.total_net.to_string(), "649.50");

        assert_eq!(
            out.set_deduction(&worker("W9"), Amount::ONE).unwrap_err(),
            DisbursementError::UnknownWorker(worker("W9"))
        );
        assert!(matches!(
            out.set_deduction(&worker("W1"), Amount::from_units(-1)),
            Err(DisbursementError::NegativeDeduction { .. })
        ));
    }

    #[test]
    fn test_reversed_week_rejected() {
        let err = weekly_disbursement(std::iter::empty(), date("2024-01-07"), date("2024-01-01"))
            .unwrap_err();
        assert!(matches!(err, DisbursementError::InvalidWeek { .. }));
    }
}
