use crate::tool::{DangerLevel, SafetyKit, Tool, ToolSpec};
use async_trait::async_trait;
use forgent_core::{ToolCategory, ToolErrorKind, ToolOutcome};

/// Lists a directory inside the workspace.
pub struct ListDirTool {
    spec: ToolSpec,
}

impl ListDirTool {
    /// Creates the tool with its default spec.
    pub fn new() -> Self {
        Self {
            spec: ToolSpec {
                name: "list_dir".to_string(),
                category: ToolCategory::Core,
                description: "List directory entries. Defaults to the workspace root.".to_string(),
                arg_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "Workspace-relative path (default: .)"}
                    }
                }),
                rate_limit: 50,
                danger_level: DangerLevel::Safe,
                timeout_secs: 30,
            },
        }
    }
}

impl Default for ListDirTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ListDirTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &serde_json::Value, safety: &SafetyKit) -> ToolOutcome {
        let path = args.get("path").and_then(|v| v.as_str()).unwrap_or(".");

        let resolved = match safety.paths.resolve(path) {
            Ok(resolved) => resolved,
            Err(e) => return ToolOutcome::err(ToolErrorKind::SafetyBlocked, e),
        };

        let mut reader = match tokio::fs::read_dir(&resolved).await {
            Ok(reader) => reader,
            Err(e) => {
                return ToolOutcome::err(ToolErrorKind::Io, format!("cannot list '{path}': {e}"))
            }
        };

        let mut entries = Vec::new();
        while let Ok(Some(entry)) = reader.next_entry().await {
            let kind = entry
                .file_type()
                .await
                .map(|t| if t.is_dir() { "dir" } else { "file" })
                .unwrap_or("file");
            entries.push(serde_json::json!({
                "name": entry.file_name().to_string_lossy(),
                "kind": kind,
            }));
        }
        entries.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));

        ToolOutcome::ok(serde_json::json!({"path": path, "entries": entries}))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::builtins::tests::test_safety;

    #[tokio::test]
    async fn test_list_sorted() {
        let (safety, dir) = test_safety();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();

        let tool = ListDirTool::new();
        match tool.execute(&serde_json::json!({}), &safety).await {
            ToolOutcome::Ok { value } => {
                let names: Vec<&str> = value["entries"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|e| e["name"].as_str().unwrap())
                    .collect();
                assert_eq!(names, vec!["a.txt", "b.txt"]);
            }
            other => panic!("expected ok, got {other:?}"),
        }
    }
}
