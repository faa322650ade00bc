use crate::tool::{DangerLevel, SafetyKit, Tool, ToolSpec};
use async_trait::async_trait;
use forgent_core::{ToolCategory, ToolOutcome};

/// Signals task completion. The reasoning engine intercepts this tool
/// name before dispatch; the implementation only echoes the summary so
/// the tool still behaves sensibly if invoked directly.
pub struct FinishTaskTool {
    spec: ToolSpec,
}

impl FinishTaskTool {
    /// Creates the tool with its default spec.
    pub fn new() -> Self {
        Self {
            spec: ToolSpec {
                name: "finish_task".to_string(),
                category: ToolCategory::Core,
                description: "Declare the task complete and provide a summary.".to_string(),
                arg_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "summary": {"type": "string", "description": "What was accomplished"}
                    },
                    "required": ["summary"]
                }),
                rate_limit: 5,
                danger_level: DangerLevel::Safe,
                timeout_secs: 30,
            },
        }
    }
}

impl Default for FinishTaskTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FinishTaskTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &serde_json::Value, _safety: &SafetyKit) -> ToolOutcome {
        let summary = args.get("summary").and_then(|v| v.as_str()).unwrap_or("");
        ToolOutcome::ok(serde_json::json!({"finished": true, "summary": summary}))
    }
}
