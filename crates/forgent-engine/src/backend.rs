use async_trait::async_trait;
use forgent_core::{ForgentResult, ToolCall};
use forgent_tools::ToolSpec;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// What the backend decided to do next.
#[derive(Debug, Clone)]
pub enum Directive {
    /// Invoke a tool and observe the result.
    Invoke(ToolCall),
    /// The task is done.
    Finish {
        /// Closing summary of the work.
        summary: String,
    },
}

/// One thought/action pair produced by the reasoning backend.
#[derive(Debug, Clone)]
pub struct Reasoning {
    /// Natural-language reasoning for this step.
    pub thought: String,
    /// The chosen action.
    pub directive: Directive,
}

impl Reasoning {
    /// A tool-invoking step.
    pub fn invoke(thought: impl Into<String>, call: ToolCall) -> Self {
        Self {
            thought: thought.into(),
            directive: Directive::Invoke(call),
        }
    }

    /// A terminal step.
    pub fn finish(thought: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            thought: thought.into(),
            directive: Directive::Finish {
                summary: summary.into(),
            },
        }
    }
}

/// The external reasoning collaborator.
///
/// Production adapters wrap an LLM provider; tests use
/// [`ScriptedBackend`]. Transport failures surface through the error
/// channel and fail the step; everything else is a [`Reasoning`].
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// Produces the next thought and action for `prompt`, given the
    /// visible tool catalogue.
    async fn reason(&self, prompt: &str, catalogue: &[ToolSpec]) -> ForgentResult<Reasoning>;
}

enum Script {
    Queue(Mutex<VecDeque<Reasoning>>),
    Repeat(Reasoning),
}

/// A deterministic scripted policy for tests.
///
/// Queue mode replays a fixed list of steps and finishes when the
/// script runs dry; repeat mode returns the same step forever (used to
/// exercise loop detection).
pub struct ScriptedBackend {
    script: Script,
}

impl ScriptedBackend {
    /// Replays `steps` in order, then finishes.
    pub fn from_steps(steps: Vec<Reasoning>) -> Self {
        Self {
            script: Script::Queue(Mutex::new(steps.into())),
        }
    }

    /// Returns `step` on every call.
    pub fn repeating(step: Reasoning) -> Self {
        Self {
            script: Script::Repeat(step),
        }
    }
}

#[async_trait]
impl ReasoningBackend for ScriptedBackend {
    async fn reason(&self, _prompt: &str, _catalogue: &[ToolSpec]) -> ForgentResult<Reasoning> {
        match &self.script {
            Script::Queue(queue) => Ok(queue
                .lock()
                .pop_front()
                .unwrap_or_else(|| Reasoning::finish("script exhausted", "script exhausted"))),
            Script::Repeat(step) => Ok(step.clone()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_replays_then_finishes() {
        let backend = ScriptedBackend::from_steps(vec![Reasoning::invoke(
            "look around",
            ToolCall::new("list_dir", serde_json::json!({})),
        )]);

        let first = backend.reason("p", &[]).await.unwrap();
        assert!(matches!(first.directive, Directive::Invoke(_)));
        let second = backend.reason("p", &[]).await.unwrap();
        assert!(matches!(second.directive, Directive::Finish { .. }));
    }

    #[tokio::test]
    async fn test_repeat_never_exhausts() {
        let backend = ScriptedBackend::repeating(Reasoning::invoke(
            "again",
            ToolCall::new("read_file", serde_json::json!({"path": "README"})),
        ));
        for _ in 0..5 {
            let step = backend.reason("p", &[]).await.unwrap();
            assert!(matches!(step.directive, Directive::Invoke(_)));
        }
    }
}
