use crate::tool::{require_str, truncate_output, DangerLevel, SafetyKit, Tool, ToolSpec};
use async_trait::async_trait;
use forgent_core::{ToolCategory, ToolErrorKind, ToolOutcome};

const MAX_READ_CHARS: usize = 50_000;

/// Reads a file inside the workspace.
pub struct FileReadTool {
    spec: ToolSpec,
}

impl FileReadTool {
    /// Creates the tool with its default spec.
    pub fn new() -> Self {
        Self {
            spec: ToolSpec {
                name: "read_file".to_string(),
                category: ToolCategory::Core,
                description: "Read a file. The path must stay inside the workspace.".to_string(),
                arg_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "Workspace-relative path"}
                    },
                    "required": ["path"]
                }),
                rate_limit: 100,
                danger_level: DangerLevel::Safe,
                timeout_secs: 30,
            },
        }
    }
}

impl Default for FileReadTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FileReadTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &serde_json::Value, safety: &SafetyKit) -> ToolOutcome {
        let path = match require_str(args, "path") {
            Ok(path) => path,
            Err(e) => return ToolOutcome::err(ToolErrorKind::InvalidArgs, e),
        };

        let resolved = match safety.paths.resolve(path) {
            Ok(resolved) => resolved,
            Err(e) => return ToolOutcome::err(ToolErrorKind::SafetyBlocked, e),
        };

        match tokio::fs::read_to_string(&resolved).await {
            Ok(content) => {
                let lines = content.lines().count();
                ToolOutcome::ok(serde_json::json!({
                    "path": path,
                    "lines": lines,
                    "content": truncate_output(&content, MAX_READ_CHARS),
                }))
            }
            Err(e) => ToolOutcome::err(ToolErrorKind::Io, format!("cannot read '{path}': {e}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::builtins::tests::test_safety;

    #[tokio::test]
    async fn test_read_existing_file() {
        let (safety, dir) = test_safety();
        std::fs::write(dir.path().join("hello.txt"), "line1\nline2\n").unwrap();

        let tool = FileReadTool::new();
        let outcome = tool
            .execute(&serde_json::json!({"path": "hello.txt"}), &safety)
            .await;
        match outcome {
            ToolOutcome::Ok { value } => {
                assert_eq!(value["lines"], 2);
                assert!(value["content"].as_str().unwrap().contains("line1"));
            }
            other => panic!("expected ok, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_read_missing_file_is_io_error() {
        let (safety, _dir) = test_safety();
        let tool = FileReadTool::new();
        let outcome = tool
            .execute(&serde_json::json!({"path": "absent.txt"}), &safety)
            .await;
        match outcome {
            ToolOutcome::Err { kind, .. } => assert_eq!(kind, ToolErrorKind::Io),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_read_outside_workspace_blocked() {
        let (safety, _dir) = test_safety();
        let tool = FileReadTool::new();
        let outcome = tool
            .execute(&serde_json::json!({"path": "../etc/passwd"}), &safety)
            .await;
        match outcome {
            ToolOutcome::Err { kind, .. } => assert_eq!(kind, ToolErrorKind::SafetyBlocked),
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_path_arg() {
        let (safety, _dir) = test_safety();
        let tool = FileReadTool::new();
        let outcome = tool.execute(&serde_json::json!({}), &safety).await;
        match outcome {
            ToolOutcome::Err { kind, .. } => assert_eq!(kind, ToolErrorKind::InvalidArgs),
            other => panic!("expected invalid args, got {other:?}"),
        }
    }
}
