use crate::tool::{truncate_output, DangerLevel, SafetyKit, Tool, ToolSpec};
use async_trait::async_trait;
use forgent_core::{ToolCategory, ToolErrorKind, ToolOutcome};

/// Reports the git working-tree status of the workspace.
pub struct GitStatusTool {
    spec: ToolSpec,
}

impl GitStatusTool {
    /// Creates the tool with its default spec.
    pub fn new() -> Self {
        Self {
            spec: ToolSpec {
                name: "git_status".to_string(),
                category: ToolCategory::Git,
                description: "Show the git status of the workspace.".to_string(),
                arg_schema: serde_json::json!({"type": "object", "properties": {}}),
                rate_limit: 20,
                danger_level: DangerLevel::Safe,
                timeout_secs: 30,
            },
        }
    }
}

impl Default for GitStatusTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for GitStatusTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, _args: &serde_json::Value, safety: &SafetyKit) -> ToolOutcome {
        let output = tokio::process::Command::new("git")
            .args(["status", "--porcelain"])
            .current_dir(&safety.workspace)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                ToolOutcome::ok(serde_json::json!({
                    "clean": stdout.trim().is_empty(),
                    "status": truncate_output(&stdout, 20_000),
                }))
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                ToolOutcome::err(
                    ToolErrorKind::Io,
                    format!("git status failed: {}", stderr.trim()),
                )
            }
            Err(e) => ToolOutcome::err(ToolErrorKind::Io, format!("cannot run git: {e}")),
        }
    }
}
