use chrono::{DateTime, Utc};
use forgent_core::{ForgentError, ForgentResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// One tracked artifact write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEntry {
    /// Workspace-relative path of the written file.
    pub path: String,
    /// Lower-case hex SHA-256 of the final written bytes.
    pub sha256: String,
    /// The run that produced this write.
    pub producing_run_id: Uuid,
    /// The agent that produced this write.
    pub producing_agent_id: String,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
    /// Set when a later entry (or a rollback) replaced this write.
    pub superseded_by: Option<String>,
    /// Backup file name under `backup/`, when the target pre-existed.
    pub backup: Option<String>,
}

/// The outcome of a rollback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackReport {
    /// Files restored from backups.
    pub restored: Vec<String>,
    /// Files removed because the run created them.
    pub removed: Vec<String>,
    /// Entries that were already superseded.
    pub already_superseded: usize,
}

/// Registry of per-run artifact manifests and pre-write backups.
///
/// Layout: `<state>/artifacts/<run_id>/manifest.json` plus
/// `<state>/artifacts/<run_id>/backup/<hash>`. Manifest writes are
/// serialized through an internal lock.
pub struct ArtifactRegistry {
    base: PathBuf,
    manifest_lock: Mutex<()>,
}

impl ArtifactRegistry {
    /// Creates a registry rooted at `<state_dir>/artifacts`.
    pub fn new(state_dir: &Path) -> Self {
        Self {
            base: state_dir.join("artifacts"),
            manifest_lock: Mutex::new(()),
        }
    }

    fn run_dir(&self, run_id: Uuid) -> PathBuf {
        self.base.join(run_id.to_string())
    }

    fn manifest_path(&self, run_id: Uuid) -> PathBuf {
        self.run_dir(run_id).join("manifest.json")
    }

    /// Copies the current content of `rel_path` (if it exists) into the
    /// run's backup directory. Returns the backup file name.
    ///
    /// Must be called before the write lands.
    pub async fn backup_if_exists(
        &self,
        run_id: Uuid,
        workspace: &Path,
        rel_path: &str,
    ) -> ForgentResult<Option<String>> {
        let target = workspace.join(rel_path);
        if !target.is_file() {
            return Ok(None);
        }
        let bytes = tokio::fs::read(&target).await?;
        let hash = sha256_hex(&bytes);
        let backup_dir = self.run_dir(run_id).join("backup");
        tokio::fs::create_dir_all(&backup_dir).await?;
        tokio::fs::write(backup_dir.join(&hash), &bytes).await?;
        Ok(Some(hash))
    }

    /// Records a completed write, appending exactly one entry to the
    /// run's manifest. An earlier active entry for the same path is
    /// marked superseded by this one.
    pub async fn record(
        &self,
        run_id: Uuid,
        agent_id: &str,
        workspace: &Path,
        rel_path: &str,
        backup: Option<String>,
    ) -> ForgentResult<ArtifactEntry> {
        let bytes = tokio::fs::read(workspace.join(rel_path)).await?;
        let entry = ArtifactEntry {
            path: rel_path.to_string(),
            sha256: sha256_hex(&bytes),
            producing_run_id: run_id,
            producing_agent_id: agent_id.to_string(),
            created_at: Utc::now(),
            superseded_by: None,
            backup,
        };

        let _guard = self.manifest_lock.lock().await;
        let mut manifest = self.load_manifest(run_id).await.unwrap_or_default();
        for existing in manifest
            .iter_mut()
            .filter(|e| e.path == entry.path && e.superseded_by.is_none())
        {
            existing.superseded_by = Some(entry.path.clone());
        }
        manifest.push(entry.clone());
        self.store_manifest(run_id, &manifest).await?;

        info!(run_id = %run_id, path = %rel_path, sha256 = %entry.sha256, "Artifact recorded");
        Ok(entry)
    }

    /// Reads a run's manifest.
    pub async fn manifest(&self, run_id: Uuid) -> ForgentResult<Vec<ArtifactEntry>> {
        if !self.manifest_path(run_id).exists() {
            return Err(ForgentError::Rollback(format!(
                "rollback-unknown-run: {run_id}"
            )));
        }
        self.load_manifest(run_id).await
    }

    /// Whether the registry has a manifest for `run_id`.
    pub async fn knows_run(&self, run_id: Uuid) -> bool {
        self.manifest_path(run_id).exists()
    }

    /// Restores every active write of the run, in reverse order:
    /// backed-up files regain their pre-run bytes, created files are
    /// removed. Entries are marked superseded, never deleted, so a
    /// second rollback succeeds trivially.
    pub async fn rollback(&self, run_id: Uuid, workspace: &Path) -> ForgentResult<RollbackReport> {
        let _guard = self.manifest_lock.lock().await;
        if !self.manifest_path(run_id).exists() {
            return Err(ForgentError::Rollback(format!(
                "rollback-unknown-run: {run_id}"
            )));
        }
        let mut manifest = self.load_manifest(run_id).await?;

        let mut report = RollbackReport {
            restored: Vec::new(),
            removed: Vec::new(),
            already_superseded: 0,
        };

        for entry in manifest.iter_mut().rev() {
            if entry.superseded_by.is_some() {
                report.already_superseded += 1;
                continue;
            }
            let target = workspace.join(&entry.path);
            match &entry.backup {
                Some(backup) => {
                    let backup_path = self.base.join(run_id.to_string()).join("backup").join(backup);
                    let bytes = tokio::fs::read(&backup_path).await.map_err(|e| {
                        ForgentError::Rollback(format!("rollback-io: missing backup: {e}"))
                    })?;
                    if let Some(parent) = target.parent() {
                        tokio::fs::create_dir_all(parent).await.ok();
                    }
                    tokio::fs::write(&target, bytes)
                        .await
                        .map_err(|e| ForgentError::Rollback(format!("rollback-io: {e}")))?;
                    report.restored.push(entry.path.clone());
                }
                None => {
                    if target.exists() {
                        tokio::fs::remove_file(&target)
                            .await
                            .map_err(|e| ForgentError::Rollback(format!("rollback-io: {e}")))?;
                    }
                    report.removed.push(entry.path.clone());
                }
            }
            entry.superseded_by = Some(entry.path.clone());
        }

        self.store_manifest(run_id, &manifest).await?;
        info!(
            run_id = %run_id,
            restored = report.restored.len(),
            removed = report.removed.len(),
            "Rollback applied"
        );
        Ok(report)
    }

    async fn load_manifest(&self, run_id: Uuid) -> ForgentResult<Vec<ArtifactEntry>> {
        let path = self.manifest_path(run_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = tokio::fs::read_to_string(path).await?;
        let manifest = serde_json::from_str(&raw)
            .map_err(|e| ForgentError::State(format!("corrupt manifest: {e}")))?;
        Ok(manifest)
    }

    async fn store_manifest(&self, run_id: Uuid, manifest: &[ArtifactEntry]) -> ForgentResult<()> {
        let dir = self.run_dir(run_id);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(
            self.manifest_path(run_id),
            serde_json::to_string_pretty(manifest)?,
        )
        .await?;
        Ok(())
    }
}

/// Lower-case hex SHA-256.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    async fn registry() -> (ArtifactRegistry, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let registry = ArtifactRegistry::new(&dir.path().join(".state"));
        (registry, dir)
    }

    #[tokio::test]
    async fn test_record_computes_sha256() {
        let (registry, dir) = registry().await;
        let run = Uuid::new_v4();
        tokio::fs::write(dir.path().join("a.ts"), "export const a = 1;")
            .await
            .unwrap();

        let entry = registry
            .record(run, "02", dir.path(), "a.ts", None)
            .await
            .unwrap();
        assert_eq!(entry.sha256, sha256_hex(b"export const a = 1;"));
        assert_eq!(entry.producing_agent_id, "02");
        assert!(entry.superseded_by.is_none());
    }

    #[tokio::test]
    async fn test_rewrite_supersedes_earlier_entry() {
        let (registry, dir) = registry().await;
        let run = Uuid::new_v4();
        tokio::fs::write(dir.path().join("a.ts"), "v1").await.unwrap();
        registry.record(run, "02", dir.path(), "a.ts", None).await.unwrap();
        tokio::fs::write(dir.path().join("a.ts"), "v2").await.unwrap();
        registry.record(run, "03", dir.path(), "a.ts", None).await.unwrap();

        let manifest = registry.manifest(run).await.unwrap();
        assert_eq!(manifest.len(), 2);
        assert!(manifest[0].superseded_by.is_some());
        assert!(manifest[1].superseded_by.is_none());
        assert!(manifest[1].created_at >= manifest[0].created_at);
    }

    #[tokio::test]
    async fn test_rollback_restores_and_removes() {
        let (registry, dir) = registry().await;
        let run = Uuid::new_v4();

        // b.ts pre-exists and is modified; a.ts is created by the run.
        tokio::fs::write(dir.path().join("b.ts"), "original b")
            .await
            .unwrap();
        let original_sha = sha256_hex(b"original b");

        let backup = registry
            .backup_if_exists(run, dir.path(), "b.ts")
            .await
            .unwrap();
        assert!(backup.is_some());
        tokio::fs::write(dir.path().join("b.ts"), "modified b")
            .await
            .unwrap();
        registry
            .record(run, "02", dir.path(), "b.ts", backup)
            .await
            .unwrap();

        let no_backup = registry
            .backup_if_exists(run, dir.path(), "a.ts")
            .await
            .unwrap();
        assert!(no_backup.is_none());
        tokio::fs::write(dir.path().join("a.ts"), "new a").await.unwrap();
        registry
            .record(run, "02", dir.path(), "a.ts", None)
            .await
            .unwrap();

        let report = registry.rollback(run, dir.path()).await.unwrap();
        assert_eq!(report.restored, vec!["b.ts"]);
        assert_eq!(report.removed, vec!["a.ts"]);

        assert!(!dir.path().join("a.ts").exists());
        let restored = tokio::fs::read(dir.path().join("b.ts")).await.unwrap();
        assert_eq!(sha256_hex(&restored), original_sha);

        // Entries survive, marked superseded.
        let manifest = registry.manifest(run).await.unwrap();
        assert_eq!(manifest.len(), 2);
        assert!(manifest.iter().all(|e| e.superseded_by.is_some()));
    }

    #[tokio::test]
    async fn test_rollback_idempotent() {
        let (registry, dir) = registry().await;
        let run = Uuid::new_v4();
        tokio::fs::write(dir.path().join("x.txt"), "x").await.unwrap();
        registry.record(run, "02", dir.path(), "x.txt", None).await.unwrap();

        registry.rollback(run, dir.path()).await.unwrap();
        let second = registry.rollback(run, dir.path()).await.unwrap();
        assert!(second.restored.is_empty());
        assert!(second.removed.is_empty());
        assert_eq!(second.already_superseded, 1);
    }

    #[tokio::test]
    async fn test_rollback_unknown_run() {
        let (registry, dir) = registry().await;
        let err = registry
            .rollback(Uuid::new_v4(), dir.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("rollback-unknown-run"));
    }
}
