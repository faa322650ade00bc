use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The classified kind of a user request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Build a new feature or component.
    BuildFeature,
    /// Fix a reported bug or crash.
    FixBug,
    /// Restructure existing code without changing behavior.
    Refactor,
    /// Improve performance.
    Optimize,
    /// Analyze the project without changing it.
    Scan,
    /// Produce a design or architecture proposal.
    Design,
    /// Write or run tests.
    Test,
    /// Review existing code.
    Review,
    /// Write documentation.
    Document,
    /// Ship or release the project.
    Deploy,
    /// Explain code or behavior.
    Explain,
    /// Produce a plan without executing it.
    Plan,
    /// Install or configure dependencies.
    Install,
    /// Anything that did not match a more specific type.
    Generic,
}

impl TaskType {
    /// Task types that modify the workspace and therefore require a
    /// stricter gate decision.
    pub fn is_destructive(self) -> bool {
        matches!(
            self,
            TaskType::BuildFeature
                | TaskType::FixBug
                | TaskType::Refactor
                | TaskType::Optimize
                | TaskType::Deploy
        )
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskType::BuildFeature => "build_feature",
            TaskType::FixBug => "fix_bug",
            TaskType::Refactor => "refactor",
            TaskType::Optimize => "optimize",
            TaskType::Scan => "scan",
            TaskType::Design => "design",
            TaskType::Test => "test",
            TaskType::Review => "review",
            TaskType::Document => "document",
            TaskType::Deploy => "deploy",
            TaskType::Explain => "explain",
            TaskType::Plan => "plan",
            TaskType::Install => "install",
            TaskType::Generic => "generic",
        };
        write!(f, "{s}")
    }
}

/// A classified user request, ready for pipeline selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// The classified task type.
    pub task_type: TaskType,
    /// The original, unmodified request text.
    pub raw_query: String,
    /// Extracted parameters (e.g. `subject`).
    pub params: BTreeMap<String, String>,
    /// UTC timestamp of classification.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates a task with no parameters.
    pub fn new(task_type: TaskType, raw_query: impl Into<String>) -> Self {
        Self {
            task_type,
            raw_query: raw_query.into(),
            params: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Whether this task may modify the workspace.
    pub fn is_destructive(&self) -> bool {
        self.task_type.is_destructive()
    }

    /// The extracted subject, if any.
    pub fn subject(&self) -> Option<&str> {
        self.params.get("subject").map(String::as_str)
    }
}
