use chrono::{DateTime, Utc};
use forgent_core::{ForgentError, ForgentResult, TaskType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

/// An autonomy gate decision, one JSONL line in `audit.log`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEntry {
    /// When the decision was made.
    pub timestamp: DateTime<Utc>,
    /// The task type under consideration.
    pub task_type: TaskType,
    /// The confidence the decision was computed from.
    pub confidence: f64,
    /// Whether the task was classified destructive.
    pub is_destructive: bool,
    /// The decision taken.
    pub decision: Decision,
    /// Human-readable justification.
    pub reason: String,
}

/// Approve or reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// The step may proceed.
    Approve,
    /// The step (and run) stops.
    Reject,
}

/// The last committed orchestrator snapshot (`state.json`).
///
/// Readers tolerate unknown fields so older binaries can open newer
/// state files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// `<run_id>:<agent_id>` of the in-flight step, if any.
    #[serde(default)]
    pub pipeline_position: Option<String>,
    /// The most recent analyzer confidence.
    #[serde(default)]
    pub last_confidence: f64,
    /// Total runs submitted this session.
    #[serde(default)]
    pub run_count: u64,
    /// Total artifacts registered this session.
    #[serde(default)]
    pub artifact_count: u64,
    /// One-line summary of the cached analyzer report.
    #[serde(default)]
    pub last_longcot_summary: String,
}

/// Single-writer store over `<workspace>/.state/`.
///
/// All appends are ordered through one internal lock; reads may happen
/// concurrently from other handles.
pub struct StateStore {
    state_dir: PathBuf,
    audit_path: PathBuf,
    write_lock: Mutex<()>,
}

impl StateStore {
    /// Opens (creating if needed) the state directory for `workspace`.
    pub async fn open(workspace: &Path, audit_override: Option<PathBuf>) -> ForgentResult<Self> {
        let state_dir = workspace.join(".state");
        tokio::fs::create_dir_all(state_dir.join("longcot")).await?;
        let audit_path = audit_override.unwrap_or_else(|| state_dir.join("audit.log"));
        if let Some(parent) = audit_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(Self {
            state_dir,
            audit_path,
            write_lock: Mutex::new(()),
        })
    }

    /// The `.state` directory path.
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Commits the orchestrator snapshot to `state.json`.
    pub async fn write_snapshot(&self, snapshot: &StateSnapshot) -> ForgentResult<()> {
        let _guard = self.write_lock.lock().await;
        let json = serde_json::to_string_pretty(snapshot)?;
        tokio::fs::write(self.state_dir.join("state.json"), json).await?;
        Ok(())
    }

    /// Reads the last committed snapshot, if any.
    pub async fn read_snapshot(&self) -> ForgentResult<Option<StateSnapshot>> {
        let path = self.state_dir.join("state.json");
        if !path.exists() {
            return Ok(None);
        }
        let raw = tokio::fs::read_to_string(path).await?;
        let snapshot = serde_json::from_str(&raw)
            .map_err(|e| ForgentError::State(format!("cannot parse state.json: {e}")))?;
        Ok(Some(snapshot))
    }

    /// Appends one human-readable block to `session_context.md`.
    pub async fn append_session_event(&self, title: &str, body: &str) -> ForgentResult<()> {
        let _guard = self.write_lock.lock().await;
        let block = format!(
            "## {} — {}\n\n{}\n\n",
            Utc::now().to_rfc3339(),
            title,
            body.trim()
        );
        append(&self.state_dir.join("session_context.md"), block.as_bytes()).await
    }

    /// Appends one decision entry to the audit log.
    pub async fn append_decision(&self, entry: &DecisionEntry) -> ForgentResult<()> {
        let _guard = self.write_lock.lock().await;
        info!(
            task_type = %entry.task_type,
            confidence = entry.confidence,
            decision = ?entry.decision,
            "audit"
        );
        let line = format!("{}\n", serde_json::to_string(entry)?);
        append(&self.audit_path, line.as_bytes()).await
    }

    /// Replays the audit log.
    pub async fn read_decisions(&self) -> ForgentResult<Vec<DecisionEntry>> {
        if !self.audit_path.exists() {
            return Ok(Vec::new());
        }
        let raw = tokio::fs::read_to_string(&self.audit_path).await?;
        let mut entries = Vec::new();
        for line in raw.lines().filter(|l| !l.trim().is_empty()) {
            let entry: DecisionEntry = serde_json::from_str(line)
                .map_err(|e| ForgentError::State(format!("corrupt audit line: {e}")))?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Appends one metrics object to `metrics.jsonl`.
    pub async fn append_metrics(&self, value: &serde_json::Value) -> ForgentResult<()> {
        let _guard = self.write_lock.lock().await;
        let line = format!("{value}\n");
        append(&self.state_dir.join("metrics.jsonl"), line.as_bytes()).await
    }

    /// Stores a full analyzer report snapshot under `longcot/`.
    pub async fn write_longcot_snapshot(&self, report: &serde_json::Value) -> ForgentResult<PathBuf> {
        let _guard = self.write_lock.lock().await;
        let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3fZ");
        let path = self.state_dir.join("longcot").join(format!("{stamp}.json"));
        tokio::fs::write(&path, serde_json::to_string_pretty(report)?).await?;
        Ok(path)
    }
}

async fn append(path: &Path, bytes: &[u8]) -> ForgentResult<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    Ok(())
}
