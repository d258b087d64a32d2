//! Ledger files on disk.
//!
//! A ledger file holds one assignment ledger plus the hash of the plan it was
//! built from. Writes go to a sibling temp file that is then renamed over the
//! target, so readers see either the old ledger or the new one in full.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskwork_allocation::AssignmentLedger;
use taskwork_id::{AssignmentId, PlanId};

use crate::error::CliError;

/// Persisted ledger with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<AssignmentId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanId>,

    /// Hash of the plan file the rows were scheduled from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_hash: Option<String>,

    pub updated_at: DateTime<Utc>,

    pub ledger: AssignmentLedger,
}

impl LedgerFile {
    /// Create an empty ledger file.
    pub fn new(assignment: Option<AssignmentId>, plan: Option<PlanId>) -> Self {
        Self {
            assignment,
            plan,
            plan_hash: None,
            updated_at: Utc::now(),
            ledger: AssignmentLedger::default(),
        }
    }

    /// Returns true if the ledger was built from a different plan.
    pub fn is_stale(&self, plan_hash: &str) -> bool {
        self.plan_hash.as_deref().is_some_and(|h| h != plan_hash)
    }

    /// Mark the ledger as just modified.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Load a ledger file if it exists.
pub async fn load(path: &Path) -> Result<Option<LedgerFile>> {
    if !tokio::fs::try_exists(path)
        .await
        .with_context(|| format!("Failed to check ledger at {:?}", path))?
    {
        return Ok(None);
    }

    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read ledger from {:?}", path))?;

    let file = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse ledger from {:?}", path))?;

    Ok(Some(file))
}

/// Load a ledger file that must exist.
pub async fn load_existing(path: &Path) -> Result<LedgerFile> {
    load(path)
        .await?
        .ok_or_else(|| CliError::LedgerNotFound(path.to_path_buf()).into())
}

/// Write a ledger file, replacing any previous contents in one step.
pub async fn save(path: &Path, file: &LedgerFile) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create ledger directory {:?}", dir))?;
    }

    let contents = serde_json::to_string_pretty(file)?;
    let tmp = temp_path(path);

    tokio::fs::write(&tmp, contents)
        .await
        .with_context(|| format!("Failed to write ledger to {:?}", tmp))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to replace ledger at {:?}", path))?;

    tracing::debug!(path = %path.display(), rows = file.ledger.rows().len(), "ledger saved");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "ledger.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskwork_allocation::{Task, TaskId, WorkerId, WorkerPool};

    fn scheduled_file() -> LedgerFile {
        let mut file = LedgerFile::new(AssignmentId::parse("TWA-1").ok(), None);
        file.ledger.set_start_date(Some("2024-01-01".parse().unwrap()));
        let tasks = vec![Task::new(
            TaskId::parse("T1").unwrap(),
            "10".parse().unwrap(),
            "3".parse().unwrap(),
            "100".parse().unwrap(),
        )];
        let pool: WorkerPool = ["W1", "W2"]
            .iter()
            .map(|n| WorkerId::parse(n).unwrap())
            .collect();
        file.ledger.run_smart_assign(&tasks, &pool).unwrap();
        file.plan_hash = Some("sha256:abc".to_string());
        file
    }

    #[tokio::test]
    async fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("plan.ledger.json");
        let file = scheduled_file();

        save(&path, &file).await.unwrap();
        assert!(!temp_path(&path).exists());

        let loaded = load(&path).await.unwrap().unwrap();
        assert_eq!(loaded, file);
        assert_eq!(loaded.ledger.rows().len(), 4);
    }

    #[tokio::test]
    async fn load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("none.json")).await.unwrap().is_none());

        let err = load_existing(&dir.path().join("none.json")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::LedgerNotFound(_))
        ));
    }

    #[test]
    fn stale_detection() {
        let file = scheduled_file();
        assert!(!file.is_stale("sha256:abc"));
        assert!(file.is_stale("sha256:def"));
        assert!(!LedgerFile::new(None, None).is_stale("sha256:def"));
    }
}
