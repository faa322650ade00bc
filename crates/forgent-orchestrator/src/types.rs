use chrono::{DateTime, Utc};
use forgent_core::Task;
use forgent_engine::ReactStep;
use forgent_skills::SkillSelection;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// The gate's verdict for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    /// Approved by policy alone.
    AutoApprove,
    /// Rejected by policy alone.
    AutoReject,
    /// Approved through the manual path.
    ManualApproved,
    /// Rejected through the manual path.
    ManualRejected,
}

impl GateDecision {
    /// Whether the step may proceed.
    pub fn is_approved(self) -> bool {
        matches!(self, GateDecision::AutoApprove | GateDecision::ManualApproved)
    }
}

/// How a pipeline run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalStatus {
    /// Every step completed.
    Success,
    /// A gate rejected a step.
    Rejected,
    /// The circuit breaker opened or a step failed fatally.
    Failed,
    /// The run finished but at least one step stopped early.
    Partial,
    /// Cancellation took effect between steps.
    Cancelled,
}

/// The committed result of one pipeline step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// The acting agent.
    pub agent_id: String,
    /// The analyzer confidence captured at step entry.
    pub confidence: f64,
    /// Selected skills with scores, in rank order.
    pub skills_selected: Vec<SkillSelection>,
    /// The recorded reasoning trace.
    pub reasoning_trace: Vec<ReactStep>,
    /// Workspace-relative paths written during the step.
    pub artifacts_produced: Vec<String>,
    /// The gate's verdict.
    pub gate_decision: GateDecision,
    /// Wall-clock duration of the step.
    pub duration_ms: u64,
}

/// One full pipeline execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Unique run id.
    pub run_id: Uuid,
    /// The classified request.
    pub task: Task,
    /// Agent ids in execution order.
    pub pipeline: Vec<String>,
    /// Committed step results.
    pub step_results: Vec<StepResult>,
    /// How the run ended.
    pub final_status: FinalStatus,
    /// Run start time.
    pub started_at: DateTime<Utc>,
    /// Run end time.
    pub ended_at: Option<DateTime<Utc>>,
}

/// A point-in-time view of the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// `<step>/<total>:<agent>` while a run is executing.
    pub current_pipeline_position: Option<String>,
    /// The cached analyzer confidence.
    pub last_confidence: f64,
    /// Artifacts registered this session.
    pub artifact_count: u64,
    /// `closed` or `open`.
    pub circuit_breaker_state: String,
}

/// Cooperative cancellation for a run. Takes effect at the next step
/// boundary; the in-flight tool call completes.
#[derive(Debug, Clone, Default)]
pub struct CancellationHandle {
    flag: Arc<AtomicBool>,
}

impl CancellationHandle {
    /// Creates a fresh, uncancelled handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_decision_approval() {
        assert!(GateDecision::AutoApprove.is_approved());
        assert!(GateDecision::ManualApproved.is_approved());
        assert!(!GateDecision::AutoReject.is_approved());
        assert!(!GateDecision::ManualRejected.is_approved());
    }

    #[test]
    fn test_cancellation_handle() {
        let handle = CancellationHandle::new();
        assert!(!handle.is_cancelled());
        let clone = handle.clone();
        clone.cancel();
        assert!(handle.is_cancelled());
    }
}
