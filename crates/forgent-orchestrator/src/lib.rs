//! The Forgent orchestrator: pipeline scheduling and policy.
//!
//! A classified request selects a fixed agent pipeline. Before every
//! step the gate consults the cached analyzer confidence and the
//! task's destructiveness; each decision is appended to the audit
//! log. Approved steps get a top-K skill selection, a bounded context
//! bundle, and a reasoning invocation with the agent's tool
//! allowlist; writes flow through the artifact registry for rollback.
//! Repeated step failures trip a circuit breaker that aborts the run.

/// The run-level circuit breaker.
pub mod circuit;
/// Context bundle assembly.
pub mod context;
/// The orchestrator itself.
pub mod engine;
/// Confidence gating.
pub mod gate;
/// The task-type → pipeline map.
pub mod pipelines;
/// Bounded inter-agent message queues.
pub mod queue;
/// Run, step, and status types.
pub mod types;
/// The artifact-recording write tool.
pub mod write_tool;

pub use engine::Orchestrator;
pub use pipelines::pipeline_for;
pub use queue::{AgentMessage, MessageKind, MessageQueue};
pub use types::{
    CancellationHandle, FinalStatus, GateDecision, PipelineRun, StatusSnapshot, StepResult,
};
