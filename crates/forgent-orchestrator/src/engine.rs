use crate::circuit::CircuitBreaker;
use crate::context::build_context;
use crate::gate;
use crate::pipelines::pipeline_for;
use crate::queue::{AgentMessage, MessageKind, MessageQueue};
use crate::types::{CancellationHandle, FinalStatus, PipelineRun, StatusSnapshot, StepResult};
use crate::write_tool::{RecordingWriteTool, StepCursor};
use chrono::Utc;
use forgent_agent::{AgentDescriptor, AgentRegistry};
use forgent_core::{intent, parse_intent, ForgentConfig, ForgentError, ForgentResult, Task};
use forgent_engine::{EngineOutcome, ReactEngine, ReactStep, ReasoningBackend};
use forgent_longcot::{Analyzer, LongCotReport};
use forgent_runner::{HealingRunner, RunResult};
use forgent_scan::{ScanDepth, Scanner};
use forgent_skills::{SkillLoader, SkillRegistry};
use forgent_state::{ArtifactRegistry, Decision, DecisionEntry, RollbackReport, StateSnapshot, StateStore};
use forgent_tools::{default_registry, ToolRegistry};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

/// Per-pair message queue capacity.
const QUEUE_CAP: usize = 32;

/// The scheduling and policy core.
///
/// Owns every subsystem: scanner, analyzer, skills, agents, tools,
/// reasoning engine, state store, and artifact registry. One request
/// yields one pipeline run; steps execute strictly sequentially and
/// each step is committed (result appended, artifacts registered,
/// audit logged) before the next begins.
pub struct Orchestrator {
    workspace: PathBuf,
    config: ForgentConfig,
    backend: Arc<dyn ReasoningBackend>,
    agents: AgentRegistry,
    skills: SkillRegistry,
    tools: ToolRegistry,
    engine: ReactEngine,
    state: StateStore,
    artifacts: Arc<ArtifactRegistry>,
    cursor: Arc<StepCursor>,
    report: RwLock<LongCotReport>,
    queue: Mutex<MessageQueue>,
    cancel: CancellationHandle,
    position: Mutex<Option<String>>,
    run_count: AtomicU64,
    artifact_count: AtomicU64,
    circuit_open: AtomicBool,
}

impl Orchestrator {
    /// Constructs all subsystems for `workspace`. When the workspace
    /// already holds source files, the scanner and analyzer run
    /// eagerly; otherwise analysis is deferred until the first rescan.
    pub async fn new(
        workspace: &Path,
        mut config: ForgentConfig,
        backend: Arc<dyn ReasoningBackend>,
    ) -> ForgentResult<Self> {
        config.apply_env();

        let state = StateStore::open(workspace, config.audit_log_path.clone()).await?;
        let artifacts = Arc::new(ArtifactRegistry::new(state.state_dir()));
        let cursor = Arc::new(StepCursor::new());

        let mut tools = default_registry(workspace)?;
        tools.register(Arc::new(RecordingWriteTool::new(
            artifacts.clone(),
            cursor.clone(),
        )));

        let agents = AgentRegistry::load_dir(&workspace.join(".forgent/agents"));
        let skills = SkillLoader::new(workspace.join(".forgent/skills")).load_all();
        let engine = ReactEngine::new(config.max_steps, config.history_max);

        let scanner = Scanner::new();
        let scan = scanner.scan(workspace, ScanDepth::Deep)?;
        let report = if scan.files.iter().any(|f| f.language.is_source()) {
            let analyzer = Analyzer::new(config.backtrack_threshold, config.max_backtracks);
            let report = analyzer.analyze(&scan.fingerprint, &scan.files);
            state
                .write_longcot_snapshot(&serde_json::to_value(&report)?)
                .await?;
            report
        } else {
            LongCotReport::no_project()
        };

        info!(
            workspace = %workspace.display(),
            architecture = %report.architecture,
            confidence = report.avg_confidence(),
            "Orchestrator ready"
        );

        let orchestrator = Self {
            workspace: workspace.to_path_buf(),
            config,
            backend,
            agents,
            skills,
            tools,
            engine,
            state,
            artifacts,
            cursor,
            report: RwLock::new(report),
            queue: Mutex::new(MessageQueue::new(QUEUE_CAP)),
            cancel: CancellationHandle::new(),
            position: Mutex::new(None),
            run_count: AtomicU64::new(0),
            artifact_count: AtomicU64::new(0),
            circuit_open: AtomicBool::new(false),
        };
        orchestrator.commit_snapshot().await?;
        Ok(orchestrator)
    }

    /// The cancellation handle for the in-flight (or next) run.
    pub fn cancel_handle(&self) -> CancellationHandle {
        self.cancel.clone()
    }

    /// The cached analyzer report.
    pub fn report(&self) -> LongCotReport {
        self.report.read().clone()
    }

    /// Re-runs the scanner and analyzer, replacing the cached report.
    pub async fn rescan(&self) -> ForgentResult<LongCotReport> {
        let scan = Scanner::new().scan(&self.workspace, ScanDepth::Deep)?;
        let analyzer = Analyzer::new(self.config.backtrack_threshold, self.config.max_backtracks);
        let report = analyzer.analyze(&scan.fingerprint, &scan.files);
        self.state
            .write_longcot_snapshot(&serde_json::to_value(&report)?)
            .await?;
        *self.report.write() = report.clone();
        self.commit_snapshot().await?;
        Ok(report)
    }

    /// Classifies the request, selects the pipeline, and executes it
    /// step by step under the confidence gate.
    pub async fn submit(&self, request_text: &str) -> ForgentResult<PipelineRun> {
        let trimmed = request_text.trim();
        if trimmed.is_empty() {
            return Err(ForgentError::Input("empty request".to_string()));
        }
        if intent::is_unknown_slash(trimmed) {
            return Err(ForgentError::Input(format!(
                "unknown slash command: {}",
                trimmed.split_whitespace().next().unwrap_or(trimmed)
            )));
        }

        let task = parse_intent(request_text);
        let pipeline = pipeline_for(task.task_type);
        let run_id = Uuid::new_v4();
        self.run_count.fetch_add(1, Ordering::SeqCst);

        let run = self.execute_pipeline(run_id, task, pipeline).await?;

        self.record_run(&run).await?;
        Ok(run)
    }

    async fn execute_pipeline(
        &self,
        run_id: Uuid,
        task: Task,
        pipeline: Vec<String>,
    ) -> ForgentResult<PipelineRun> {
        let started_at = Utc::now();
        let run_start = Instant::now();
        let run_timeout = Duration::from_secs(self.config.run_timeout_secs);

        self.state
            .append_session_event(
                "run started",
                &format!(
                    "run {run_id}\ntask: {} ({})\npipeline: [{}]",
                    task.task_type,
                    task.raw_query.trim(),
                    pipeline.join(", ")
                ),
            )
            .await?;

        let mut breaker = CircuitBreaker::new();
        let mut step_results: Vec<StepResult> = Vec::new();
        let mut prior_summaries: Vec<String> = Vec::new();
        let mut final_status = FinalStatus::Success;
        let mut any_partial = false;

        'pipeline: for (idx, agent_id) in pipeline.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(run_id = %run_id, "Run cancelled at step boundary");
                final_status = FinalStatus::Cancelled;
                break;
            }
            if run_start.elapsed() > run_timeout {
                warn!(run_id = %run_id, "run-timeout exceeded");
                final_status = FinalStatus::Failed;
                break;
            }

            *self.position.lock() =
                Some(format!("{}/{}:{agent_id}", idx + 1, pipeline.len()));

            // Confidence is captured once at step entry and does not
            // drift within the step.
            let confidence = self.report.read().avg_confidence();
            let gate = gate::decide(confidence, task.is_destructive(), &self.config);

            self.state
                .append_decision(&DecisionEntry {
                    timestamp: Utc::now(),
                    task_type: task.task_type,
                    confidence,
                    is_destructive: task.is_destructive(),
                    decision: if gate.decision.is_approved() {
                        Decision::Approve
                    } else {
                        Decision::Reject
                    },
                    reason: gate.reason.clone(),
                })
                .await?;

            if !gate.decision.is_approved() {
                step_results.push(StepResult {
                    agent_id: agent_id.clone(),
                    confidence,
                    skills_selected: Vec::new(),
                    reasoning_trace: Vec::new(),
                    artifacts_produced: Vec::new(),
                    gate_decision: gate.decision,
                    duration_ms: 0,
                });
                final_status = FinalStatus::Rejected;
                break;
            }

            let agent = self
                .agents
                .get(agent_id)
                .cloned()
                .unwrap_or_else(|| fallback_agent(agent_id));

            let selections =
                self.skills
                    .select(&task.raw_query, task.task_type, agent_id, self.config.skill_top_k);
            let skill_bodies: Vec<(String, String)> = selections
                .iter()
                .filter_map(|s| self.skills.get(&s.name))
                .map(|d| (d.name.clone(), d.body.clone()))
                .collect();

            let report_summary = self.report.read().summary();
            let prompt = build_context(
                &agent,
                &report_summary,
                &skill_bodies,
                &prior_summaries,
                &task,
                self.config.context_budget,
            );

            // Retry the step until it succeeds or the breaker opens.
            loop {
                self.cursor.enter(run_id, agent_id);
                let step_start = Instant::now();
                let outcome = match tokio::time::timeout(
                    Duration::from_secs(self.config.step_timeout_secs),
                    self.engine.run(
                        &prompt,
                        self.backend.as_ref(),
                        &self.tools,
                        &agent.tool_categories,
                        run_id,
                    ),
                )
                .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => EngineOutcome::Failed {
                        reason: format!(
                            "run-timeout: step exceeded {}s",
                            self.config.step_timeout_secs
                        ),
                        trace: Vec::new(),
                    },
                };
                self.cursor.clear();
                let duration_ms = step_start.elapsed().as_millis() as u64;

                let artifacts_produced = collect_artifacts(outcome.trace());
                self.artifact_count
                    .fetch_add(artifacts_produced.len() as u64, Ordering::SeqCst);

                step_results.push(StepResult {
                    agent_id: agent_id.clone(),
                    confidence,
                    skills_selected: selections.clone(),
                    reasoning_trace: outcome.trace().to_vec(),
                    artifacts_produced,
                    gate_decision: gate.decision,
                    duration_ms,
                });

                match &outcome {
                    EngineOutcome::Completed { summary, .. } => {
                        breaker.record_success(agent_id);
                        prior_summaries.push(format!("agent {agent_id}: {summary}"));
                        self.enqueue_handoff(&pipeline, idx, run_id, summary);
                        break;
                    }
                    EngineOutcome::Partial { reason, .. } => {
                        any_partial = true;
                        breaker.record_success(agent_id);
                        let summary = format!("stopped early ({reason})");
                        prior_summaries.push(format!("agent {agent_id}: {summary}"));
                        self.enqueue_handoff(&pipeline, idx, run_id, &summary);
                        break;
                    }
                    EngineOutcome::Failed { reason, .. } => {
                        warn!(run_id = %run_id, agent = %agent_id, reason = %reason, "Step failed");
                        if breaker.record_failure(agent_id) {
                            self.circuit_open.store(true, Ordering::SeqCst);
                            self.state
                                .append_session_event(
                                    "circuit open",
                                    &format!("run {run_id} aborted at agent {agent_id}: {reason}"),
                                )
                                .await?;
                            final_status = FinalStatus::Failed;
                            break 'pipeline;
                        }
                        // Retry the same agent step.
                    }
                }
            }
        }

        *self.position.lock() = None;
        if final_status == FinalStatus::Success && any_partial {
            final_status = FinalStatus::Partial;
        }

        Ok(PipelineRun {
            run_id,
            task,
            pipeline,
            step_results,
            final_status,
            started_at,
            ended_at: Some(Utc::now()),
        })
    }

    fn enqueue_handoff(&self, pipeline: &[String], idx: usize, run_id: Uuid, summary: &str) {
        if let Some(next) = pipeline.get(idx + 1) {
            self.queue.lock().send(AgentMessage {
                from_agent: pipeline[idx].clone(),
                to_agent: next.clone(),
                kind: MessageKind::Handoff,
                payload: summary.to_string(),
                correlation_id: run_id,
            });
        }
    }

    async fn record_run(&self, run: &PipelineRun) -> ForgentResult<()> {
        self.state
            .append_metrics(&serde_json::json!({
                "run_id": run.run_id,
                "task_type": run.task.task_type,
                "final_status": run.final_status,
                "steps": run.step_results.len(),
                "artifacts": run
                    .step_results
                    .iter()
                    .map(|s| s.artifacts_produced.len())
                    .sum::<usize>(),
                "started_at": run.started_at,
                "ended_at": run.ended_at,
            }))
            .await?;
        self.state
            .append_session_event(
                "run ended",
                &format!(
                    "run {}\nstatus: {:?}\nsteps: {}",
                    run.run_id,
                    run.final_status,
                    run.step_results.len()
                ),
            )
            .await?;
        self.commit_snapshot().await
    }

    async fn commit_snapshot(&self) -> ForgentResult<()> {
        let (confidence, summary) = {
            let report = self.report.read();
            (report.avg_confidence(), report.summary())
        };
        let position = self.position.lock().clone();
        self.state
            .write_snapshot(&StateSnapshot {
                pipeline_position: position,
                last_confidence: confidence,
                run_count: self.run_count.load(Ordering::SeqCst),
                artifact_count: self.artifact_count.load(Ordering::SeqCst),
                last_longcot_summary: summary,
            })
            .await
    }

    /// Marks every artifact of the run superseded and restores
    /// pre-run content from the registry backups.
    pub async fn rollback(&self, run_id: Uuid) -> ForgentResult<RollbackReport> {
        let report = self.artifacts.rollback(run_id, &self.workspace).await?;
        self.state
            .append_session_event(
                "rollback",
                &format!(
                    "run {run_id}\nrestored: [{}]\nremoved: [{}]",
                    report.restored.join(", "),
                    report.removed.join(", ")
                ),
            )
            .await?;
        Ok(report)
    }

    /// A point-in-time status view.
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            current_pipeline_position: self.position.lock().clone(),
            last_confidence: self.report.read().avg_confidence(),
            artifact_count: self.artifact_count.load(Ordering::SeqCst),
            circuit_breaker_state: if self.circuit_open.load(Ordering::SeqCst) {
                "open".to_string()
            } else {
                "closed".to_string()
            },
        }
    }

    /// Launches a project process with self-healing, sharing the tool
    /// registry's denylist.
    pub async fn run_project(
        &self,
        command: &str,
        env: &BTreeMap<String, String>,
        max_attempts: u32,
    ) -> ForgentResult<RunResult> {
        let runner = HealingRunner::new(self.tools.safety().clone(), Uuid::new_v4());
        runner.run_with_healing(command, env, max_attempts).await
    }

    /// Destructively reads the oldest queued message for the ordered
    /// agent pair, typically the handoff left by a completed step.
    pub fn next_message(&self, from_agent: &str, to_agent: &str) -> Option<AgentMessage> {
        self.queue.lock().receive(from_agent, to_agent)
    }

    /// The artifact registry (for inspection in callers and tests).
    pub fn artifacts(&self) -> &Arc<ArtifactRegistry> {
        &self.artifacts
    }

    /// The state store.
    pub fn state(&self) -> &StateStore {
        &self.state
    }
}

fn fallback_agent(agent_id: &str) -> AgentDescriptor {
    let role = match agent_id {
        "00" => "forensic",
        "01" => "architect",
        "02" => "builder",
        "03" => "designer",
        "04" => "reviewer",
        "05" => "integrator",
        "09" => "qa",
        _ => "agent",
    };
    AgentDescriptor {
        id: agent_id.to_string(),
        role: role.to_string(),
        content: String::new(),
        tool_categories: default_categories(),
        skill_affinity: BTreeMap::new(),
    }
}

fn default_categories() -> std::collections::BTreeSet<forgent_core::ToolCategory> {
    use forgent_core::ToolCategory;
    [
        ToolCategory::Core,
        ToolCategory::Utility,
        ToolCategory::Test,
        ToolCategory::Pkg,
    ]
    .into_iter()
    .collect()
}

/// Paths written by `write_file` actions whose observation reports
/// success (tool errors render as `tool-…` strings).
fn collect_artifacts(trace: &[ReactStep]) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    let mut artifacts = Vec::new();
    for step in trace {
        let Some(action) = &step.action else { continue };
        if action.name != "write_file" {
            continue;
        }
        let Some(observation) = &step.observation else {
            continue;
        };
        if observation.starts_with("tool-") {
            continue;
        }
        if let Some(path) = action.arguments.get("path").and_then(|v| v.as_str()) {
            if seen.insert(path.to_string()) {
                artifacts.push(path.to_string());
            }
        }
    }
    artifacts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_artifacts_dedup_and_errors() {
        use forgent_core::ToolCall;
        let step = |name: &str, path: &str, obs: &str| ReactStep {
            index: 0,
            thought: String::new(),
            action: Some(ToolCall::new(
                name,
                serde_json::json!({"path": path, "content": "x"}),
            )),
            observation: Some(obs.to_string()),
            is_terminal: false,
            is_summary: false,
        };

        let trace = vec![
            step("write_file", "a.ts", r#"{"path":"a.ts"}"#),
            step("write_file", "a.ts", r#"{"path":"a.ts"}"#),
            step("write_file", "b.ts", "tool-safety-blocked: outside workspace"),
            step("read_file", "c.ts", r#"{"path":"c.ts"}"#),
        ];
        assert_eq!(collect_artifacts(&trace), vec!["a.ts"]);
    }

    #[test]
    fn test_fallback_agent_roles() {
        assert_eq!(fallback_agent("00").role, "forensic");
        assert_eq!(fallback_agent("09").role, "qa");
        assert_eq!(fallback_agent("42").role, "agent");
    }
}
