use crate::tool::{require_str, DangerLevel, SafetyKit, Tool, ToolSpec};
use async_trait::async_trait;
use forgent_core::{ToolCategory, ToolErrorKind, ToolOutcome};
use tracing::info;

const MAX_WRITE_BYTES: usize = 10 * 1024 * 1024;

/// Writes a file inside the workspace, creating parent directories.
pub struct FileWriteTool {
    spec: ToolSpec,
}

impl FileWriteTool {
    /// Creates the tool with its default spec.
    pub fn new() -> Self {
        Self {
            spec: ToolSpec {
                name: "write_file".to_string(),
                category: ToolCategory::Core,
                description: "Write content to a file inside the workspace. Parent directories are created.".to_string(),
                arg_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "Workspace-relative path"},
                        "content": {"type": "string", "description": "Content to write"}
                    },
                    "required": ["path", "content"]
                }),
                rate_limit: 50,
                danger_level: DangerLevel::Modify,
                timeout_secs: 30,
            },
        }
    }
}

impl Default for FileWriteTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &serde_json::Value, safety: &SafetyKit) -> ToolOutcome {
        let path = match require_str(args, "path") {
            Ok(path) => path,
            Err(e) => return ToolOutcome::err(ToolErrorKind::InvalidArgs, e),
        };
        let content = match args.get("content").and_then(|v| v.as_str()) {
            Some(content) => content,
            None => {
                return ToolOutcome::err(
                    ToolErrorKind::InvalidArgs,
                    "missing required string argument 'content'",
                )
            }
        };

        if content.len() > MAX_WRITE_BYTES {
            return ToolOutcome::err(
                ToolErrorKind::InvalidArgs,
                format!(
                    "content too large: {} bytes (max {MAX_WRITE_BYTES})",
                    content.len()
                ),
            );
        }

        let resolved = match safety.paths.resolve(path) {
            Ok(resolved) => resolved,
            Err(e) => return ToolOutcome::err(ToolErrorKind::SafetyBlocked, e),
        };

        if let Some(parent) = resolved.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return ToolOutcome::err(
                    ToolErrorKind::Io,
                    format!("cannot create directories for '{path}': {e}"),
                );
            }
        }

        match tokio::fs::write(&resolved, content).await {
            Ok(()) => {
                info!(path = %path, bytes = content.len(), "File written");
                ToolOutcome::ok(serde_json::json!({
                    "path": path,
                    "bytes_written": content.len(),
                }))
            }
            Err(e) => ToolOutcome::err(ToolErrorKind::Io, format!("cannot write '{path}': {e}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::builtins::tests::test_safety;

    #[tokio::test]
    async fn test_write_and_read_back() {
        let (safety, dir) = test_safety();
        let tool = FileWriteTool::new();
        let outcome = tool
            .execute(
                &serde_json::json!({"path": "src/new.rs", "content": "fn main() {}"}),
                &safety,
            )
            .await;
        assert!(outcome.is_ok());
        let written = std::fs::read_to_string(dir.path().join("src/new.rs")).unwrap();
        assert_eq!(written, "fn main() {}");
    }

    #[tokio::test]
    async fn test_write_outside_workspace_blocked() {
        let (safety, _dir) = test_safety();
        let tool = FileWriteTool::new();
        let outcome = tool
            .execute(
                &serde_json::json!({"path": "/etc/evil.conf", "content": "x"}),
                &safety,
            )
            .await;
        match outcome {
            ToolOutcome::Err { kind, .. } => assert_eq!(kind, ToolErrorKind::SafetyBlocked),
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_content_no_partial_effect() {
        let (safety, dir) = test_safety();
        let tool = FileWriteTool::new();
        let outcome = tool
            .execute(&serde_json::json!({"path": "orphan.txt"}), &safety)
            .await;
        assert!(!outcome.is_ok());
        assert!(!dir.path().join("orphan.txt").exists());
    }
}
