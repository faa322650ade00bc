use crate::tool::{require_str, DangerLevel, SafetyKit, Tool, ToolSpec};
use async_trait::async_trait;
use forgent_core::{ToolCategory, ToolErrorKind, ToolOutcome};

/// Creates a directory (and parents) inside the workspace.
pub struct MakeDirTool {
    spec: ToolSpec,
}

impl MakeDirTool {
    /// Creates the tool with its default spec.
    pub fn new() -> Self {
        Self {
            spec: ToolSpec {
                name: "make_dir".to_string(),
                category: ToolCategory::Utility,
                description: "Create a directory inside the workspace.".to_string(),
                arg_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "Workspace-relative path"}
                    },
                    "required": ["path"]
                }),
                rate_limit: 20,
                danger_level: DangerLevel::Modify,
                timeout_secs: 30,
            },
        }
    }
}

impl Default for MakeDirTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for MakeDirTool {
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

        match tokio::fs::create_dir_all(&resolved).await {
            Ok(()) => ToolOutcome::ok(serde_json::json!({"path": path, "created": true})),
            Err(e) => ToolOutcome::err(ToolErrorKind::Io, format!("cannot create '{path}': {e}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::builtins::tests::test_safety;

    #[tokio::test]
    async fn test_creates_nested_dirs() {
        let (safety, dir) = test_safety();
        let tool = MakeDirTool::new();
        let outcome = tool
            .execute(&serde_json::json!({"path": "a/b/c"}), &safety)
            .await;
        assert!(outcome.is_ok());
        assert!(dir.path().join("a/b/c").is_dir());
    }

    #[tokio::test]
    async fn test_blocks_escape() {
        let (safety, _dir) = test_safety();
        let tool = MakeDirTool::new();
        let outcome = tool
            .execute(&serde_json::json!({"path": "../escape"}), &safety)
            .await;
        assert!(!outcome.is_ok());
    }
}
