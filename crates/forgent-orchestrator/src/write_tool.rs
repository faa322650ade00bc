use async_trait::async_trait;
use forgent_core::ToolOutcome;
use forgent_state::ArtifactRegistry;
use forgent_tools::builtins::FileWriteTool;
use forgent_tools::{SafetyKit, Tool, ToolSpec};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// The (run, agent) the orchestrator is currently executing. The
/// recording write tool reads it to attribute artifacts.
#[derive(Default)]
pub struct StepCursor {
    current: Mutex<Option<(Uuid, String)>>,
}

impl StepCursor {
    /// Creates an idle cursor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the executing step.
    pub fn enter(&self, run_id: Uuid, agent_id: &str) {
        *self.current.lock() = Some((run_id, agent_id.to_string()));
    }

    /// Clears the cursor between steps.
    pub fn clear(&self) {
        *self.current.lock() = None;
    }

    fn get(&self) -> Option<(Uuid, String)> {
        self.current.lock().clone()
    }
}

/// `write_file` wrapped so every write flows through the artifact
/// registry: the pre-write content is backed up first, and the new
/// sha256 is recorded after the write lands.
pub struct RecordingWriteTool {
    inner: FileWriteTool,
    artifacts: Arc<ArtifactRegistry>,
    cursor: Arc<StepCursor>,
}

impl RecordingWriteTool {
    /// Wraps the builtin write tool.
    pub fn new(artifacts: Arc<ArtifactRegistry>, cursor: Arc<StepCursor>) -> Self {
        Self {
            inner: FileWriteTool::new(),
            artifacts,
            cursor,
        }
    }
}

#[async_trait]
impl Tool for RecordingWriteTool {
    fn spec(&self) -> &ToolSpec {
        self.inner.spec()
    }

    async fn execute(&self, args: &serde_json::Value, safety: &SafetyKit) -> ToolOutcome {
        let step = self.cursor.get();

        // Workspace-relative path, resolved the same way the inner
        // tool will resolve it.
        let rel_path = args
            .get("path")
            .and_then(|v| v.as_str())
            .and_then(|raw| safety.paths.resolve(raw).ok())
            .and_then(|abs| {
                abs.strip_prefix(safety.paths.root())
                    .ok()
                    .map(|rel| rel.to_string_lossy().replace('\\', "/"))
            });

        let backup = match (&step, &rel_path) {
            (Some((run_id, _)), Some(rel)) => self
                .artifacts
                .backup_if_exists(*run_id, safety.paths.root(), rel)
                .await
                .unwrap_or_else(|e| {
                    warn!(error = %e, "Pre-write backup failed");
                    None
                }),
            _ => None,
        };

        let outcome = self.inner.execute(args, safety).await;

        if outcome.is_ok() {
            if let (Some((run_id, agent_id)), Some(rel)) = (step, rel_path) {
                if let Err(e) = self
                    .artifacts
                    .record(run_id, &agent_id, safety.paths.root(), &rel, backup)
                    .await
                {
                    warn!(error = %e, path = %rel, "Artifact recording failed");
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use forgent_security::{CommandGuard, PathGuard, RateLimiter};

    #[tokio::test]
    async fn test_write_records_artifact_with_backup() {
        let dir = tempfile::tempdir().unwrap();
        let safety = SafetyKit {
            paths: PathGuard::new(dir.path()).unwrap(),
            commands: CommandGuard::new(),
            limiter: RateLimiter::new(),
            workspace: dir.path().to_path_buf(),
        };
        let artifacts = Arc::new(ArtifactRegistry::new(&dir.path().join(".state")));
        let cursor = Arc::new(StepCursor::new());
        let run_id = Uuid::new_v4();
        cursor.enter(run_id, "02");

        // Pre-existing file: the write must back it up.
        std::fs::write(dir.path().join("b.ts"), "original").unwrap();

        let tool = RecordingWriteTool::new(artifacts.clone(), cursor.clone());
        let outcome = tool
            .execute(
                &serde_json::json!({"path": "b.ts", "content": "modified"}),
                &safety,
            )
            .await;
        assert!(outcome.is_ok());

        let manifest = artifacts.manifest(run_id).await.unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest[0].path, "b.ts");
        assert!(manifest[0].backup.is_some());
        assert_eq!(manifest[0].producing_agent_id, "02");
    }

    #[tokio::test]
    async fn test_no_cursor_no_recording() {
        let dir = tempfile::tempdir().unwrap();
        let safety = SafetyKit {
            paths: PathGuard::new(dir.path()).unwrap(),
            commands: CommandGuard::new(),
            limiter: RateLimiter::new(),
            workspace: dir.path().to_path_buf(),
        };
        let artifacts = Arc::new(ArtifactRegistry::new(&dir.path().join(".state")));
        let cursor = Arc::new(StepCursor::new());
        let run_id = Uuid::new_v4();

        let tool = RecordingWriteTool::new(artifacts.clone(), cursor);
        let outcome = tool
            .execute(
                &serde_json::json!({"path": "x.txt", "content": "x"}),
                &safety,
            )
            .await;
        assert!(outcome.is_ok());
        assert!(!artifacts.knows_run(run_id).await);
    }
}
