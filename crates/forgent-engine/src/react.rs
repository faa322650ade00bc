use crate::backend::{Directive, ReasoningBackend};
use forgent_core::{ToolCall, ToolCategory};
use forgent_tools::ToolRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, warn};
use uuid::Uuid;

/// Consecutive identical tool calls that trigger loop detection.
const LOOP_REPEAT_LIMIT: u32 = 3;

/// One recorded think/act/observe triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactStep {
    /// Monotonic step number within the invocation (compaction does
    /// not renumber).
    pub index: u32,
    /// The backend's thought for this step.
    pub thought: String,
    /// The tool invocation, when the step acted.
    pub action: Option<ToolCall>,
    /// The tool result, rendered as text.
    pub observation: Option<String>,
    /// Whether this step ended the invocation.
    pub is_terminal: bool,
    /// Whether this step is a compaction summary of older steps.
    pub is_summary: bool,
}

/// How a reasoning invocation ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EngineOutcome {
    /// The backend declared the task finished.
    Completed {
        /// The backend's closing summary.
        summary: String,
        /// The recorded trace.
        trace: Vec<ReactStep>,
    },
    /// The loop stopped early: `step-budget` or `loop-detected`.
    Partial {
        /// Why the loop stopped.
        reason: String,
        /// The recorded trace.
        trace: Vec<ReactStep>,
    },
    /// Infrastructure failure (the backend was unreachable).
    Failed {
        /// The failure description.
        reason: String,
        /// The trace up to the failure.
        trace: Vec<ReactStep>,
    },
}

impl EngineOutcome {
    /// The recorded trace, whatever the outcome.
    pub fn trace(&self) -> &[ReactStep] {
        match self {
            EngineOutcome::Completed { trace, .. }
            | EngineOutcome::Partial { trace, .. }
            | EngineOutcome::Failed { trace, .. } => trace,
        }
    }

    /// Whether the invocation completed normally.
    pub fn is_completed(&self) -> bool {
        matches!(self, EngineOutcome::Completed { .. })
    }
}

/// The bounded think/act/observe loop.
///
/// The engine owns no tool state: it receives the registry, the
/// caller's category allowlist, and the backend per invocation, so
/// concurrent invocations never share history.
pub struct ReactEngine {
    budget_steps: u32,
    history_max: usize,
    budget_tokens: Option<usize>,
}

impl ReactEngine {
    /// Creates an engine with the given step budget and history bound.
    pub fn new(budget_steps: u32, history_max: usize) -> Self {
        Self {
            budget_steps,
            history_max: history_max.max(2),
            budget_tokens: None,
        }
    }

    /// Sets an advisory token budget. Exceeding it is logged, never
    /// enforced; the hard bounds are steps and history length.
    pub fn with_token_budget(mut self, tokens: usize) -> Self {
        self.budget_tokens = Some(tokens);
        self
    }

    /// Runs the loop until the backend finishes, a budget is
    /// exhausted, or a loop is detected.
    pub async fn run(
        &self,
        prompt: &str,
        backend: &dyn ReasoningBackend,
        tools: &ToolRegistry,
        allowlist: &BTreeSet<ToolCategory>,
        session: Uuid,
    ) -> EngineOutcome {
        let catalogue = tools.catalogue(allowlist);
        let mut history: Vec<ReactStep> = Vec::new();
        let mut next_index = 0u32;
        let mut last_call: Option<ToolCall> = None;
        let mut repeat_count = 0u32;

        for _ in 0..self.budget_steps {
            let rendered = render_prompt(prompt, &history);
            if let Some(budget) = self.budget_tokens {
                // Rough estimate, 4 chars per token.
                let estimate = rendered.len() / 4;
                if estimate > budget {
                    warn!(estimate, budget, "Advisory token budget exceeded");
                }
            }
            let reasoning = match backend.reason(&rendered, &catalogue).await {
                Ok(reasoning) => reasoning,
                Err(e) => {
                    warn!(error = %e, "Reasoning backend unreachable");
                    return EngineOutcome::Failed {
                        reason: format!("engine-llm-unreachable: {e}"),
                        trace: history,
                    };
                }
            };

            match reasoning.directive {
                Directive::Finish { summary } => {
                    history.push(ReactStep {
                        index: next_index,
                        thought: reasoning.thought,
                        action: None,
                        observation: None,
                        is_terminal: true,
                        is_summary: false,
                    });
                    info!(steps = history.len(), "Reasoning completed");
                    return EngineOutcome::Completed {
                        summary,
                        trace: history,
                    };
                }
                Directive::Invoke(call) if call.name == "finish_task" => {
                    let summary = call
                        .arguments
                        .get("summary")
                        .and_then(|v| v.as_str())
                        .unwrap_or("finished")
                        .to_string();
                    history.push(ReactStep {
                        index: next_index,
                        thought: reasoning.thought,
                        action: Some(call),
                        observation: None,
                        is_terminal: true,
                        is_summary: false,
                    });
                    return EngineOutcome::Completed {
                        summary,
                        trace: history,
                    };
                }
                Directive::Invoke(call) => {
                    if last_call.as_ref() == Some(&call) {
                        repeat_count += 1;
                    } else {
                        repeat_count = 1;
                        last_call = Some(call.clone());
                    }

                    if repeat_count >= LOOP_REPEAT_LIMIT {
                        // The third identical call is recorded but not
                        // dispatched.
                        history.push(ReactStep {
                            index: next_index,
                            thought: reasoning.thought,
                            action: Some(call.clone()),
                            observation: Some(format!(
                                "engine-loop-detected: '{}' repeated {LOOP_REPEAT_LIMIT} times",
                                call.name
                            )),
                            is_terminal: false,
                            is_summary: false,
                        });
                        history.push(ReactStep {
                            index: next_index + 1,
                            thought: "identical tool call repeated; stopping".to_string(),
                            action: None,
                            observation: None,
                            is_terminal: true,
                            is_summary: false,
                        });
                        warn!(tool = %call.name, "Loop detected in reasoning");
                        return EngineOutcome::Partial {
                            reason: "loop-detected".to_string(),
                            trace: history,
                        };
                    }

                    let outcome = tools.invoke(&call, allowlist, session).await;
                    history.push(ReactStep {
                        index: next_index,
                        thought: reasoning.thought,
                        action: Some(call),
                        observation: Some(outcome.as_observation()),
                        is_terminal: false,
                        is_summary: false,
                    });
                }
            }

            next_index += 1;
            compact_history(&mut history, self.history_max);
        }

        info!(budget = self.budget_steps, "Step budget exhausted");
        EngineOutcome::Partial {
            reason: "step-budget".to_string(),
            trace: history,
        }
    }
}

fn render_prompt(prompt: &str, history: &[ReactStep]) -> String {
    if history.is_empty() {
        return prompt.to_string();
    }
    let mut rendered = String::from(prompt);
    rendered.push_str("\n\n## Previous steps\n");
    for step in history {
        rendered.push_str(&format!("- [{}] {}", step.index, step.thought));
        if let Some(obs) = &step.observation {
            let short: String = obs.chars().take(200).collect();
            rendered.push_str(&format!(" => {short}"));
        }
        rendered.push('\n');
    }
    rendered
}

/// Compacts the oldest half of non-summary steps into one marked
/// summary step once the history exceeds `max`. Existing summary steps
/// are never re-compressed.
fn compact_history(history: &mut Vec<ReactStep>, max: usize) {
    if history.len() <= max {
        return;
    }

    let keep = history.iter().take_while(|s| s.is_summary).count();
    let compressible = history.len() - keep;
    let compress_count = compressible / 2;
    if compress_count == 0 {
        return;
    }

    let compressed: Vec<ReactStep> = history.drain(keep..keep + compress_count).collect();
    let first_index = compressed.first().map(|s| s.index).unwrap_or(0);
    let last_index = compressed.last().map(|s| s.index).unwrap_or(0);

    let mut aggregate = String::new();
    for step in &compressed {
        if let Some(action) = &step.action {
            aggregate.push_str(&format!("{}; ", action.name));
        }
        if let Some(obs) = &step.observation {
            let short: String = obs.chars().take(80).collect();
            aggregate.push_str(&short);
            aggregate.push(' ');
        }
    }

    history.insert(
        keep,
        ReactStep {
            index: first_index,
            thought: format!(
                "[summary of steps {first_index}-{last_index}] {}",
                aggregate.trim()
            ),
            action: None,
            observation: None,
            is_terminal: false,
            is_summary: true,
        },
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::backend::{Reasoning, ScriptedBackend};
    use forgent_core::ForgentError;
    use forgent_tools::default_registry;

    fn core_allowlist() -> BTreeSet<ToolCategory> {
        [ToolCategory::Core, ToolCategory::Utility]
            .into_iter()
            .collect()
    }

    #[tokio::test]
    async fn test_immediate_finish() {
        let dir = tempfile::tempdir().unwrap();
        let tools = default_registry(dir.path()).unwrap();
        let backend = ScriptedBackend::from_steps(vec![Reasoning::finish("done", "all good")]);

        let engine = ReactEngine::new(20, 40);
        let outcome = engine
            .run("do things", &backend, &tools, &core_allowlist(), Uuid::new_v4())
            .await;

        match outcome {
            EngineOutcome::Completed { summary, trace } => {
                assert_eq!(summary, "all good");
                assert_eq!(trace.len(), 1);
                assert!(trace[0].is_terminal);
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_step_budget_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let tools = default_registry(dir.path()).unwrap();
        // Budget 1 and a non-terminal action.
        let backend = ScriptedBackend::from_steps(vec![Reasoning::invoke(
            "list",
            ToolCall::new("list_dir", serde_json::json!({})),
        )]);

        let engine = ReactEngine::new(1, 40);
        let outcome = engine
            .run("look", &backend, &tools, &core_allowlist(), Uuid::new_v4())
            .await;

        match outcome {
            EngineOutcome::Partial { reason, trace } => {
                assert_eq!(reason, "step-budget");
                assert_eq!(trace.len(), 1);
            }
            other => panic!("expected partial, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_loop_detection() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README"), "readme").unwrap();
        let tools = default_registry(dir.path()).unwrap();
        let backend = ScriptedBackend::repeating(Reasoning::invoke(
            "read it again",
            ToolCall::new("read_file", serde_json::json!({"path": "README"})),
        ));

        let engine = ReactEngine::new(20, 40);
        let outcome = engine
            .run("read", &backend, &tools, &core_allowlist(), Uuid::new_v4())
            .await;

        match outcome {
            EngineOutcome::Partial { reason, trace } => {
                assert_eq!(reason, "loop-detected");
                // Three recorded attempts plus the terminal detection.
                let attempts = trace.iter().filter(|s| s.action.is_some()).count();
                assert_eq!(attempts, 3);
                assert!(trace.last().unwrap().is_terminal);
            }
            other => panic!("expected loop detection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tool_error_becomes_observation() {
        let dir = tempfile::tempdir().unwrap();
        let tools = default_registry(dir.path()).unwrap();
        let backend = ScriptedBackend::from_steps(vec![
            Reasoning::invoke(
                "try a denied tool",
                ToolCall::new("git_status", serde_json::json!({})),
            ),
            Reasoning::finish("wrap up", "done despite error"),
        ]);

        let engine = ReactEngine::new(20, 40);
        // git is not in the allowlist.
        let outcome = engine
            .run("check", &backend, &tools, &core_allowlist(), Uuid::new_v4())
            .await;

        match outcome {
            EngineOutcome::Completed { trace, .. } => {
                let obs = trace[0].observation.as_deref().unwrap();
                assert!(obs.contains("tool-denied"), "observation: {obs}");
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_history_compaction() {
        let dir = tempfile::tempdir().unwrap();
        let tools = default_registry(dir.path()).unwrap();

        // Distinct calls so loop detection never fires.
        let steps: Vec<Reasoning> = (0..10)
            .map(|i| {
                Reasoning::invoke(
                    format!("write {i}"),
                    ToolCall::new(
                        "write_file",
                        serde_json::json!({"path": format!("f{i}.txt"), "content": "x"}),
                    ),
                )
            })
            .chain(std::iter::once(Reasoning::finish("done", "wrote files")))
            .collect();
        let backend = ScriptedBackend::from_steps(steps);

        let engine = ReactEngine::new(20, 6);
        let outcome = engine
            .run("write", &backend, &tools, &core_allowlist(), Uuid::new_v4())
            .await;

        match outcome {
            EngineOutcome::Completed { trace, .. } => {
                assert!(trace.len() <= 7, "trace len {}", trace.len());
                assert!(trace.iter().any(|s| s.is_summary));
                assert!(trace[0].is_summary);
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_token_budget_is_advisory_only() {
        let dir = tempfile::tempdir().unwrap();
        let tools = default_registry(dir.path()).unwrap();
        let backend = ScriptedBackend::from_steps(vec![
            Reasoning::invoke("look", ToolCall::new("list_dir", serde_json::json!({}))),
            Reasoning::finish("done", "finished anyway"),
        ]);

        // A budget of one token is always exceeded, yet the loop runs
        // to completion.
        let engine = ReactEngine::new(20, 40).with_token_budget(1);
        let outcome = engine
            .run("long prompt text", &backend, &tools, &core_allowlist(), Uuid::new_v4())
            .await;
        assert!(outcome.is_completed());
    }

    #[tokio::test]
    async fn test_backend_failure_is_fatal() {
        struct DeadBackend;
        #[async_trait::async_trait]
        impl ReasoningBackend for DeadBackend {
            async fn reason(
                &self,
                _prompt: &str,
                _catalogue: &[forgent_tools::ToolSpec],
            ) -> forgent_core::ForgentResult<Reasoning> {
                Err(ForgentError::Engine("connection refused".to_string()))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let tools = default_registry(dir.path()).unwrap();
        let engine = ReactEngine::new(20, 40);
        let outcome = engine
            .run("x", &DeadBackend, &tools, &core_allowlist(), Uuid::new_v4())
            .await;

        match outcome {
            EngineOutcome::Failed { reason, .. } => {
                assert!(reason.contains("engine-llm-unreachable"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
