//! Error handling and display for the CLI.

use std::path::PathBuf;

use colored::Colorize;
use taskwork_allocation::{DisbursementError, LedgerError, ScheduleError};
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid plan {path}: {message}")]
    InvalidPlan { path: PathBuf, message: String },

    #[error("No ledger at {0}")]
    LedgerNotFound(PathBuf),

    #[error("Smart assign failed: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Ledger rejected: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Disbursement failed: {0}")]
    Disbursement(#[from] DisbursementError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create a plan validation error.
    pub fn invalid_plan(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidPlan {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    // Check for specific error types and provide hints
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        let hint = match cli_err {
            CliError::Schedule(ScheduleError::MissingStartDate) => {
                Some("Hint: Set `start_date` in the plan or pass --start-date YYYY-MM-DD.")
            }
            CliError::Schedule(ScheduleError::EmptyWorkerPool) => {
                Some("Hint: Add worker names to the plan's `workers` list.")
            }
            CliError::LedgerNotFound(_) => Some("Hint: Run `tw assign --plan <FILE>` first."),
            CliError::Ledger(LedgerError::TotalWorkExceeded { .. }) => Some(
                "Hint: Individual workers may exceed their share, but each task's total must stay within its total work.",
            ),
            CliError::Disbursement(DisbursementError::UnknownWorker(_)) => {
                Some("Hint: Deductions apply only to workers on the listed ledgers for that week.")
            }
            CliError::Ledger(LedgerError::RowOutOfRange { .. }) => {
                Some("Hint: Row numbers start at 1. Run `tw ledger show` to list rows.")
            }
            _ => None,
        };

        if let Some(hint) = hint {
            eprintln!("\n{}", hint.yellow());
        }
    }
}
