//! Plan file parsing and hashing helpers.
//!
//! A plan is a TOML file with the worker pool, the start date, and one
//! `[[tasks]]` table per task detail row. The same layout doubles as a task
//! work request for `tw estimate`. The plan hash is computed from a
//! canonicalized representation of the TOML, so reformatting a plan does not
//! make its ledger look stale.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use taskwork_allocation::{Amount, Quantity, Task, WorkerPool};
use taskwork_id::{AssignmentId, PlanId, RequestId};

/// Parsed plan file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanFile {
    /// Task work assignment this plan feeds.
    #[serde(default)]
    pub assignment: Option<AssignmentId>,

    /// Task work plan the workers come from.
    #[serde(default)]
    pub plan: Option<PlanId>,

    /// Task work request the tasks come from.
    #[serde(default)]
    pub request: Option<RequestId>,

    /// First day of work (`YYYY-MM-DD`).
    #[serde(default)]
    pub start_date: Option<NaiveDate>,

    #[serde(default)]
    pub workers: WorkerPool,

    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl PlanFile {
    /// Problems that make the plan unusable, one message per problem.
    ///
    /// `raw` is the plan as written, used to catch values that only became
    /// unusable when rounded to two decimals.
    pub fn problems(&self, raw: &toml::Value) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen = BTreeSet::new();
        let raw_tasks = raw.get("tasks").and_then(toml::Value::as_array);

        for (i, task) in self.tasks.iter().enumerate() {
            let row = i + 1;
            if !seen.insert(&task.id) {
                problems.push(format!("task row {row}: task {} listed more than once", task.id));
            }
            if task.daily_target < Quantity::ZERO {
                problems.push(format!("task row {row}: daily_target cannot be negative"));
            }
            let written = raw_tasks
                .and_then(|tasks| tasks.get(i))
                .and_then(|t| t.get("daily_target"));
            if task.daily_target.is_zero() && written.is_some_and(is_positive_number) {
                problems.push(format!(
                    "task row {row}: daily_target rounds to 0.00; use at least 0.01"
                ));
            }
            if task.rate < Amount::ZERO {
                problems.push(format!("task row {row}: rate cannot be negative"));
            }
        }

        problems
    }
}

fn is_positive_number(value: &toml::Value) -> bool {
    match value {
        toml::Value::Integer(n) => *n > 0,
        toml::Value::Float(f) => *f > 0.0,
        toml::Value::String(s) => s.trim().parse::<f64>().is_ok_and(|f| f > 0.0),
        _ => false,
    }
}

/// Parse a plan from TOML.
pub fn plan_from_toml_str(contents: &str) -> Result<PlanFile> {
    let plan: PlanFile = toml::from_str(contents).context("invalid plan TOML")?;
    let raw: toml::Value = toml::from_str(contents).context("invalid plan TOML")?;
    let problems = plan.problems(&raw);
    if !problems.is_empty() {
        anyhow::bail!("{}", problems.join("; "));
    }
    Ok(plan)
}

pub fn plan_hash_from_toml_str(contents: &str) -> Result<String> {
    let value: toml::Value = toml::from_str(contents).context("invalid plan TOML")?;
    if !value.is_table() {
        anyhow::bail!("plan must be a TOML table (key/value pairs at top-level)");
    }

    let json_value = serde_json::to_value(&value).context("failed to canonicalize plan")?;
    let canonical_json =
        serde_json::to_vec(&json_value).context("failed to serialize plan for hashing")?;

    let mut hasher = Sha256::new();
    hasher.update(&canonical_json);
    Ok(format!("sha256:{}", hex::encode(hasher.finalize())))
}

/// A plan together with its content hash.
#[derive(Debug, Clone)]
pub struct LoadedPlan {
    pub plan: PlanFile,
    pub hash: String,
}

/// Read, parse and hash a plan file.
pub async fn load_plan(path: &Path) -> Result<LoadedPlan> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read plan: {}", path.display()))?;

    let plan = plan_from_toml_str(&contents)
        .map_err(|e| crate::error::CliError::invalid_plan(path, format!("{e:#}")))?;
    let hash = plan_hash_from_toml_str(&contents)
        .with_context(|| format!("failed to compute plan hash: {}", path.display()))?;

    tracing::debug!(
        path = %path.display(),
        tasks = plan.tasks.len(),
        workers = plan.workers.len(),
        %hash,
        "plan loaded"
    );

    Ok(LoadedPlan { plan, hash })
}
