use crate::tool::{require_str, truncate_output, DangerLevel, SafetyKit, Tool, ToolSpec};
use async_trait::async_trait;
use forgent_core::{ToolCategory, ToolErrorKind, ToolOutcome};
use tracing::info;

/// Runs a shell command in the workspace, subject to the denylist.
pub struct RunCommandTool {
    spec: ToolSpec,
}

impl RunCommandTool {
    /// Creates the tool with its default spec.
    pub fn new() -> Self {
        Self {
            spec: ToolSpec {
                name: "run_command".to_string(),
                category: ToolCategory::Core,
                description: "Execute a shell command in the workspace. Destructive patterns are blocked.".to_string(),
                arg_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "command": {"type": "string", "description": "The shell command to run"}
                    },
                    "required": ["command"]
                }),
                rate_limit: 20,
                danger_level: DangerLevel::Destructive,
                timeout_secs: 120,
            },
        }
    }
}

impl Default for RunCommandTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for RunCommandTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &serde_json::Value, safety: &SafetyKit) -> ToolOutcome {
        let command = match require_str(args, "command") {
            Ok(command) => command,
            Err(e) => return ToolOutcome::err(ToolErrorKind::InvalidArgs, e),
        };

        if let Err(reason) = safety.commands.check(command) {
            return ToolOutcome::err(ToolErrorKind::SafetyBlocked, reason);
        }

        info!(command = %command, "Executing command");

        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&safety.workspace)
            .output()
            .await;

        match output {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                ToolOutcome::ok(serde_json::json!({
                    "exit_code": output.status.code().unwrap_or(-1),
                    "stdout": truncate_output(&stdout, 50_000),
                    "stderr": truncate_output(&stderr, 10_000),
                }))
            }
            Err(e) => ToolOutcome::err(ToolErrorKind::Io, format!("cannot spawn command: {e}")),
        }
    }
}
